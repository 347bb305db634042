use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use assignment_cell::services::AssignmentService;

use crate::models::{Emotion, RecordPredictionRequest};
use crate::services::{InsightService, PredictionService};

#[axum::debug_handler]
pub async fn record_prediction(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RecordPredictionRequest>,
) -> Result<Json<Value>, AppError> {
    let emotion: Emotion = request
        .emotion
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid emotion".to_string()))?;

    let at = request.at.unwrap_or_else(Utc::now);

    let prediction_service = PredictionService::new(&state);

    let id = prediction_service
        .record(&user.id, emotion, at, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "success": true, "id": id })))
}

#[axum::debug_handler]
pub async fn doctor_alerts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor role required".to_string()));
    }

    let assignment_service = AssignmentService::new(&state);
    let patient_ids = assignment_service
        .patient_ids_for_doctor(&user.id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if patient_ids.is_empty() {
        return Ok(Json(json!({ "items": [] })));
    }

    let insight_service = InsightService::new(&state);
    let items = insight_service
        .alerts(&patient_ids, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "items": items })))
}

#[axum::debug_handler]
pub async fn doctor_analytics(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Doctor role required".to_string()));
    }

    let assignment_service = AssignmentService::new(&state);
    let patient_ids = assignment_service
        .patient_ids_for_doctor(&user.id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let insight_service = InsightService::new(&state);
    let (summary, per_patient) = insight_service
        .analytics(&patient_ids, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "summary": summary, "perPatient": per_patient })))
}
