use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::models::Slot;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_models::user::UserSummary;

use crate::models::{
    BookMeetingRequest, BookingError, BookingOutcome, Meeting, MeetingStatus, MeetingWithPatient,
};

/// Fields of a booking request that survived validation.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: String,
    pub slot_id: Option<Uuid>,
}

/// Booking coordinator: validates a request against its slot, claims the slot
/// with a check-and-set, then records the meeting. The claim-first ordering
/// makes concurrent bookings of one slot lose deterministically instead of
/// double-booking.
pub struct BookingService {
    supabase: SupabaseClient,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Field presence and time-range checks; each failure is distinct so the
    /// handler can answer with the exact portal message.
    pub fn validate_request(request: &BookMeetingRequest) -> Result<ValidatedBooking, BookingError> {
        let (provider_id, start_time, end_time, reason) = match (
            request.provider_id,
            request.start_time,
            request.end_time,
            request.reason.as_ref(),
        ) {
            (Some(provider_id), Some(start), Some(end), Some(reason)) if !reason.is_empty() => {
                (provider_id, start, end, reason.clone())
            }
            _ => return Err(BookingError::MissingFields),
        };

        if start_time >= end_time {
            return Err(BookingError::InvalidTimeRange);
        }

        Ok(ValidatedBooking {
            provider_id,
            start_time,
            end_time,
            reason,
            slot_id: request.slot_id,
        })
    }

    pub async fn book(
        &self,
        requester: &User,
        request: BookMeetingRequest,
        auth_token: &str,
    ) -> Result<BookingOutcome, BookingError> {
        let validated = Self::validate_request(&request)?;

        info!(
            "Booking meeting for requester {} with provider {}",
            requester.id, validated.provider_id
        );

        if let Some(slot_id) = validated.slot_id {
            let slot = self.get_slot(slot_id, auth_token).await?;

            let slot = slot.ok_or(BookingError::InvalidSlot)?;
            if slot.provider_id != validated.provider_id {
                return Err(BookingError::InvalidSlot);
            }

            // Stored bounds must match the request to the millisecond.
            if slot.start_time.timestamp_millis() != validated.start_time.timestamp_millis()
                || slot.end_time.timestamp_millis() != validated.end_time.timestamp_millis()
            {
                return Err(BookingError::SlotTimeMismatch);
            }

            self.claim_slot(slot_id, auth_token).await?;

            let meeting = match self.insert_meeting(requester, &validated, auth_token).await {
                Ok(meeting) => meeting,
                Err(e) => {
                    // Compensating step: give the slot back rather than
                    // leaving it claimed with no meeting behind it.
                    if let Err(release_err) = self.release_slot(slot_id, auth_token).await {
                        warn!(
                            "Failed to release slot {} after booking error: {}",
                            slot_id, release_err
                        );
                        return Err(BookingError::SlotReconciliation(release_err.to_string()));
                    }
                    return Err(e);
                }
            };

            info!("Meeting {} booked against slot {}", meeting.id, slot_id);
            return Ok(BookingOutcome {
                meeting,
                slot_claimed: true,
            });
        }

        let meeting = self.insert_meeting(requester, &validated, auth_token).await?;
        info!("Meeting {} booked without a slot reference", meeting.id);

        Ok(BookingOutcome {
            meeting,
            slot_claimed: false,
        })
    }

    /// List the caller's own meetings ordered by start time. Providers see
    /// their provider-side records with the requesting patient attached.
    pub async fn find_meetings_for(
        &self,
        caller: &User,
        auth_token: &str,
    ) -> Result<Vec<MeetingWithPatient>, BookingError> {
        debug!("Listing meetings for caller: {}", caller.id);

        let column = if caller.is_doctor() {
            "provider_id"
        } else {
            "patient_id"
        };
        let path = format!(
            "/rest/v1/meetings?{}=eq.{}&order=start_time.asc",
            column, caller.id
        );

        let meetings: Vec<Meeting> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if !caller.is_doctor() {
            return Ok(meetings
                .into_iter()
                .map(|meeting| MeetingWithPatient {
                    meeting,
                    patient: None,
                })
                .collect());
        }

        // One lookup per distinct patient across the listing.
        let mut cache: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
        let mut listed = Vec::with_capacity(meetings.len());

        for meeting in meetings {
            let patient = match cache.get(&meeting.patient_id) {
                Some(found) => found.clone(),
                None => {
                    let found = self
                        .supabase
                        .get_user_summary(&meeting.patient_id, auth_token)
                        .await
                        .map_err(|e| BookingError::Database(e.to_string()))?;
                    cache.insert(meeting.patient_id, found.clone());
                    found
                }
            };

            listed.push(MeetingWithPatient { meeting, patient });
        }

        Ok(listed)
    }

    async fn get_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Slot>, BookingError> {
        let path = format!("/rest/v1/availability_slots?id=eq.{}&limit=1", slot_id);

        let slots: Vec<Slot> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        Ok(slots.into_iter().next())
    }

    /// Check-and-set claim: the `is_booked=eq.false` filter means a slot can
    /// be claimed exactly once; an empty result is a lost race.
    async fn claim_slot(&self, slot_id: Uuid, auth_token: &str) -> Result<(), BookingError> {
        let path = format!(
            "/rest/v1/availability_slots?id=eq.{}&is_booked=eq.false",
            slot_id
        );

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_booked": true })),
                Some(headers),
            )
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if updated.is_empty() {
            debug!("Slot {} already claimed", slot_id);
            return Err(BookingError::SlotAlreadyBooked);
        }

        Ok(())
    }

    async fn release_slot(&self, slot_id: Uuid, auth_token: &str) -> anyhow::Result<()> {
        let path = format!("/rest/v1/availability_slots?id=eq.{}", slot_id);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_booked": false })),
                Some(headers),
            )
            .await?;

        Ok(())
    }

    async fn insert_meeting(
        &self,
        requester: &User,
        validated: &ValidatedBooking,
        auth_token: &str,
    ) -> Result<Meeting, BookingError> {
        let meeting_data = json!({
            "patient_id": requester.id,
            "provider_id": validated.provider_id,
            "start_time": validated.start_time.to_rfc3339(),
            "end_time": validated.end_time.to_rfc3339(),
            "reason": validated.reason,
            "status": MeetingStatus::Pending.to_string(),
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/meetings",
                Some(auth_token),
                Some(meeting_data),
                Some(headers),
            )
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::Database("Failed to create meeting".to_string()));
        }

        let meeting: Meeting = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::Database(format!("Failed to parse created meeting: {}", e)))?;

        Ok(meeting)
    }
}
