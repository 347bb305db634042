use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ChatError, SendMessageRequest};
use crate::services::ChatService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub conversation_id: Option<Uuid>,
}

#[axum::debug_handler]
pub async fn get_threads(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let chat_service = ChatService::new(&state);

    let items = chat_service
        .threads_for(&user, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "items": items })))
}

#[axum::debug_handler]
pub async fn get_messages(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Value>, AppError> {
    let Some(conversation_id) = query.conversation_id else {
        return Ok(Json(json!({ "items": [] })));
    };

    let chat_service = ChatService::new(&state);

    let items = chat_service
        .messages(&conversation_id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({ "items": items })))
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let conversation_id = request
        .conversation_id
        .ok_or_else(|| AppError::BadRequest("Invalid payload".to_string()))?;
    let text = request
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Invalid payload".to_string()))?
        .to_string();

    let chat_service = ChatService::new(&state);

    let message = chat_service
        .send(&user, &conversation_id, &text, auth.token())
        .await
        .map_err(|e| match e {
            ChatError::NotFound => AppError::NotFound("Not found".to_string()),
            ChatError::Forbidden => {
                AppError::Forbidden("Not a participant in this conversation".to_string())
            }
            ChatError::Database(msg) => AppError::Database(msg),
        })?;

    Ok(Json(json!({ "message": message })))
}
