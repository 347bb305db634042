use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use shared_models::user::UserSummary;

/// A confirmed meeting between a requester and a provider. Stored in
/// `meetings`; wire names follow the portal frontend's camelCase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: Uuid,
    #[serde(rename = "patientId", alias = "patient_id")]
    pub patient_id: Uuid,
    #[serde(rename = "providerId", alias = "provider_id")]
    pub provider_id: Uuid,
    #[serde(rename = "startTime", alias = "start_time")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime", alias = "end_time")]
    pub end_time: DateTime<Utc>,
    pub reason: String,
    pub status: MeetingStatus,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// Booking only ever produces PENDING; the other states exist for records
/// written by out-of-scope flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeetingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingStatus::Pending => write!(f, "PENDING"),
            MeetingStatus::Confirmed => write!(f, "CONFIRMED"),
            MeetingStatus::Completed => write!(f, "COMPLETED"),
            MeetingStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Raw booking request. Required fields stay optional here so the service can
/// answer with the portal's "fields required" message instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMeetingRequest {
    pub slot_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

/// Meeting as listed to a provider, with the requesting patient attached.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingWithPatient {
    #[serde(flatten)]
    pub meeting: Meeting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<UserSummary>,
}

/// Result of a successful booking. `slot_claimed` distinguishes slot-backed
/// bookings from free-form time-range bookings.
#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    pub meeting: Meeting,
    pub slot_claimed: bool,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("providerId, startTime, endTime, reason required")]
    MissingFields,

    #[error("Invalid time range")]
    InvalidTimeRange,

    #[error("Invalid slot")]
    InvalidSlot,

    #[error("Slot time mismatch")]
    SlotTimeMismatch,

    #[error("Slot already booked")]
    SlotAlreadyBooked,

    #[error("Booking failed after slot claim and the claim could not be released: {0}")]
    SlotReconciliation(String),

    #[error("Database error: {0}")]
    Database(String),
}
