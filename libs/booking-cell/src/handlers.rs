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

use crate::models::{BookMeetingRequest, BookingError};
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn list_meetings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let meetings = booking_service
        .find_meetings_for(&user, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "meetings": meetings })))
}

#[axum::debug_handler]
pub async fn book_meeting(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookMeetingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let outcome = booking_service
        .book(&user, request, auth.token())
        .await
        .map_err(|e| match e {
            BookingError::MissingFields
            | BookingError::InvalidTimeRange
            | BookingError::InvalidSlot
            | BookingError::SlotTimeMismatch => AppError::BadRequest(e.to_string()),
            BookingError::SlotAlreadyBooked => AppError::Conflict(e.to_string()),
            BookingError::SlotReconciliation(_) => AppError::Internal(e.to_string()),
            BookingError::Database(msg) => AppError::Database(msg),
        })?;

    Ok(Json(json!({
        "success": true,
        "meeting": outcome.meeting,
        "slotClaimed": outcome.slot_claimed
    })))
}
