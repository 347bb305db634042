use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn prediction_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::record_prediction))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Doctor-facing insight routes, nested under /doctor by the app router.
pub fn doctor_insight_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/alerts", get(handlers::doctor_alerts))
        .route("/analytics", get(handlers::doctor_analytics))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
