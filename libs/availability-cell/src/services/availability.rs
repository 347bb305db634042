use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Slot, SlotInput};

/// Typed store gateway for availability slots: explicit list and create
/// operations, nothing else mutates the table.
pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// List a provider's slots ordered ascending by start time. `from`/`to`
    /// are inclusive bounds on the slot start. Unbounded result size.
    pub async fn find_slots_by_provider(
        &self,
        provider_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        auth_token: &str,
    ) -> Result<Vec<Slot>> {
        debug!("Listing slots for provider: {}", provider_id);

        let mut path = format!(
            "/rest/v1/availability_slots?provider_id=eq.{}&select=id,provider_id,start_time,end_time&order=start_time.asc",
            provider_id
        );

        if let Some(from) = from {
            let encoded = urlencoding::encode(&from.to_rfc3339()).into_owned();
            path.push_str(&format!("&start_time=gte.{}", encoded));
        }
        if let Some(to) = to {
            let encoded = urlencoding::encode(&to.to_rfc3339()).into_owned();
            path.push_str(&format!("&start_time=lte.{}", encoded));
        }

        let slots: Vec<Slot> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(slots)
    }

    /// Insert one open slot per complete start/end pair. Incomplete pairs are
    /// dropped silently; no overlap validation is performed.
    pub async fn create_slots(
        &self,
        provider_id: &str,
        inputs: Vec<SlotInput>,
        auth_token: &str,
    ) -> Result<usize> {
        let windows = Self::valid_windows(&inputs);
        debug!(
            "Creating {} slots for provider {} ({} pairs submitted)",
            windows.len(),
            provider_id,
            inputs.len()
        );

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        for (start, end) in &windows {
            let slot_data = json!({
                "provider_id": provider_id,
                "start_time": start.to_rfc3339(),
                "end_time": end.to_rfc3339(),
                "is_booked": false
            });

            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/availability_slots",
                    Some(auth_token),
                    Some(slot_data),
                    Some(headers.clone()),
                )
                .await?;
        }

        Ok(windows.len())
    }

    /// Keep only pairs carrying both bounds.
    pub fn valid_windows(inputs: &[SlotInput]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        inputs
            .iter()
            .filter_map(|pair| match (pair.start_time, pair.end_time) {
                (Some(start), Some(end)) => Some((start, end)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn incomplete_pairs_are_skipped() {
        let inputs = vec![
            SlotInput {
                start_time: Some(at(10)),
                end_time: Some(at(11)),
            },
            SlotInput {
                start_time: Some(at(12)),
                end_time: None,
            },
            SlotInput {
                start_time: None,
                end_time: Some(at(14)),
            },
            SlotInput {
                start_time: None,
                end_time: None,
            },
        ];

        let windows = AvailabilityService::valid_windows(&inputs);
        assert_eq!(windows, vec![(at(10), at(11))]);
    }

    #[test]
    fn all_complete_pairs_survive_in_order() {
        let inputs = vec![
            SlotInput {
                start_time: Some(at(9)),
                end_time: Some(at(10)),
            },
            SlotInput {
                start_time: Some(at(10)),
                end_time: Some(at(11)),
            },
        ];

        let windows = AvailabilityService::valid_windows(&inputs);
        assert_eq!(windows, vec![(at(9), at(10)), (at(10), at(11))]);
    }
}
