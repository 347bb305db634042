use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider-declared open time window. Stored in `availability_slots`;
/// serialized to clients with the camelCase names the portal frontend uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    #[serde(rename = "providerId", alias = "provider_id")]
    pub provider_id: Uuid,
    #[serde(rename = "startTime", alias = "start_time")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime", alias = "end_time")]
    pub end_time: DateTime<Utc>,
    // Listing responses never expose the flag; slot consumption is observed
    // through booking failures.
    #[serde(alias = "is_booked", default, skip_serializing)]
    pub is_booked: bool,
}

/// One raw start/end pair from a slot creation request. Either bound may be
/// absent; incomplete pairs are skipped without a per-item report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInput {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSlotsRequest {
    pub slots: Vec<SlotInput>,
}
