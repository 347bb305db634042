use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::user::UserSummary;

#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(rename = "conversationId", alias = "conversation_id")]
    pub conversation_id: Uuid,
    #[serde(rename = "senderId", alias = "sender_id")]
    pub sender_id: Uuid,
    pub text: String,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// Latest message shown as a thread preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePreview {
    pub text: String,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadItem {
    #[serde(rename = "conversationId")]
    pub conversation_id: Uuid,
    pub peer: UserSummary,
    pub last: Option<MessagePreview>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: Option<Uuid>,
    pub text: Option<String>,
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),
}
