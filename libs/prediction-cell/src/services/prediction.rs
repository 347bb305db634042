use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreatedPrediction, Emotion, PredictionSample};

/// The streak scan looks at most this far back; older history cannot extend
/// a current run.
pub const RECENT_PREDICTION_WINDOW: usize = 50;

/// Emotion prediction log: append-only writes plus the recent-window read the
/// streak scan runs on.
pub struct PredictionService {
    supabase: SupabaseClient,
}

impl PredictionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn record(
        &self,
        patient_id: &str,
        emotion: Emotion,
        at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Uuid> {
        debug!("Recording {} prediction for patient {}", emotion, patient_id);

        let prediction_data = serde_json::json!({
            "patient_id": patient_id,
            "emotion": emotion.to_string(),
            "created_at": at.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<CreatedPrediction> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/predictions",
                Some(auth_token),
                Some(prediction_data),
                Some(headers),
            )
            .await?;

        result
            .into_iter()
            .next()
            .map(|p| p.id)
            .ok_or_else(|| anyhow!("Failed to record prediction"))
    }

    /// A patient's most recent predictions, newest first, capped at the scan
    /// window.
    pub async fn recent_for(
        &self,
        patient_id: &Uuid,
        auth_token: &str,
    ) -> Result<Vec<PredictionSample>> {
        let path = format!(
            "/rest/v1/predictions?patient_id=eq.{}&select=emotion,created_at&order=created_at.desc&limit={}",
            patient_id, RECENT_PREDICTION_WINDOW
        );

        let samples: Vec<PredictionSample> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(samples)
    }

    /// Length of the run of NEGATIVE labels at the head of a newest-first
    /// sample list.
    pub fn negative_streak(samples: &[PredictionSample]) -> usize {
        samples
            .iter()
            .take_while(|s| s.emotion == Emotion::Negative)
            .count()
    }
}
