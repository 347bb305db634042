use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use booking_cell::models::Meeting;
use prediction_cell::models::Emotion;
use shared_models::user::{Role, UserSummary};

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
}

/// Meeting record with both parties attached, as handed to the export
/// consumer (CSV rendering happens downstream).
#[derive(Debug, Clone, Serialize)]
pub struct MeetingExportRecord {
    #[serde(flatten)]
    pub meeting: Meeting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<UserSummary>,
}

/// Per-patient prediction counts for the aggregated export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionAggregate {
    #[serde(rename = "patientId")]
    pub patient_id: Uuid,
    pub negative: i64,
    pub neutral: i64,
    pub positive: i64,
    pub total: i64,
    #[serde(rename = "lastAt")]
    pub last_at: Option<DateTime<Utc>>,
}

/// Row projection the aggregation folds over.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionExportRow {
    pub patient_id: Uuid,
    pub emotion: Emotion,
    pub created_at: DateTime<Utc>,
}

/// User counts by role for the admin overview.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RoleCounts {
    #[serde(rename = "PATIENT")]
    pub patients: i64,
    #[serde(rename = "DOCTOR")]
    pub doctors: i64,
    #[serde(rename = "ADMIN")]
    pub admins: i64,
}

impl RoleCounts {
    pub fn add(&mut self, role: Role) {
        match role {
            Role::Patient => self.patients += 1,
            Role::Doctor => self.doctors += 1,
            Role::Admin => self.admins += 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("User not found")]
    UserNotFound,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Database error: {0}")]
    Database(String),
}
