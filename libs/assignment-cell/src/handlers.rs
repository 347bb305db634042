use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::services::AssignmentService;

/// Role-dependent assignment view: patients see their doctor, doctors see
/// their patient roster.
#[axum::debug_handler]
pub async fn get_assignments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let assignment_service = AssignmentService::new(&state);

    if user.is_patient() {
        let doctor = assignment_service
            .assigned_doctor(&user.id, auth.token())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        return Ok(Json(json!({ "doctor": doctor })));
    }

    if user.is_doctor() {
        let patients = assignment_service
            .assigned_patients(&user.id, auth.token())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        return Ok(Json(json!({ "patients": patients })));
    }

    Ok(Json(json!({})))
}

#[axum::debug_handler]
pub async fn get_doctor_patients(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor role required".to_string()));
    }

    let assignment_service = AssignmentService::new(&state);

    let patients = assignment_service
        .assigned_patients(&user.id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "patients": patients })))
}
