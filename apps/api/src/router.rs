use std::sync::Arc;

use axum::{
    routing::get,
    Router,
};

use admin_cell::router::admin_routes;
use assignment_cell::router::{assignment_routes, doctor_roster_routes};
use auth_cell::router::auth_routes;
use availability_cell::router::availability_routes;
use booking_cell::router::meeting_routes;
use chat_cell::router::chat_routes;
use prediction_cell::router::{doctor_insight_routes, prediction_routes};
use profile_cell::router::profile_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    // /doctor combines the roster view with prediction insights
    let doctor_routes = doctor_roster_routes(state.clone()).merge(doctor_insight_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "Vitalink portal API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/profile", profile_routes(state.clone()))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/meetings", meeting_routes(state.clone()))
        .nest("/assignments", assignment_routes(state.clone()))
        .nest("/predictions", prediction_routes(state.clone()))
        .nest("/doctor", doctor_routes)
        .nest("/chat", chat_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}
