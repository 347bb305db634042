use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use assignment_cell::services::AssignmentService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AccountError, ResetPasswordRequest, UsersQuery};
use crate::services::{AccountService, ReportService};

fn require_admin(user: &User) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let account_service = AccountService::new(&state);

    let users = account_service
        .list_users(query.role, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "users": users })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let email = request.email.unwrap_or_default();
    let new_password = request.new_password.unwrap_or_default();
    if email.is_empty() || new_password.len() < 8 {
        return Err(AppError::BadRequest(
            "email and newPassword (>= 8 chars) required".to_string(),
        ));
    }

    let account_service = AccountService::new(&state);

    account_service
        .reset_password(&email, &new_password, auth.token())
        .await
        .map_err(|e| match e {
            AccountError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AccountError::Hash(msg) => AppError::Internal(msg),
            AccountError::Database(msg) => AppError::Database(msg),
        })?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn assign_random(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let assignment_service = AssignmentService::new(&state);

    let updated = assignment_service
        .assign_all_unassigned(auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "updated": updated })))
}

#[axum::debug_handler]
pub async fn unassigned_patients(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let assignment_service = AssignmentService::new(&state);

    let patients = assignment_service
        .unassigned_patients(auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "patients": patients })))
}

#[axum::debug_handler]
pub async fn analytics(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let report_service = ReportService::new(&state);

    let (summary, users) = report_service
        .global_analytics(auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "summary": summary, "users": users })))
}

#[axum::debug_handler]
pub async fn flags(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let report_service = ReportService::new(&state);

    let items = report_service
        .global_flags(auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "items": items })))
}

#[axum::debug_handler]
pub async fn export_meetings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let report_service = ReportService::new(&state);

    let records = report_service
        .export_meetings(auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "records": records })))
}

#[axum::debug_handler]
pub async fn export_predictions(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let report_service = ReportService::new(&state);

    let records = report_service
        .prediction_aggregates(auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "records": records })))
}
