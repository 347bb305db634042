use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn assignment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::get_assignments))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Doctor-facing roster routes, nested under /doctor by the app router.
pub fn doctor_roster_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/patients", get(handlers::get_doctor_patients))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
