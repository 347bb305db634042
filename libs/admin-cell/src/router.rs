use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/reset-password", post(handlers::reset_password))
        .route("/assign-random", post(handlers::assign_random))
        .route("/assignments/unassigned", get(handlers::unassigned_patients))
        .route("/analytics", get(handlers::analytics))
        .route("/flags", get(handlers::flags))
        .route("/records/export", get(handlers::export_meetings))
        .route("/records/predictions", get(handlers::export_predictions))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
