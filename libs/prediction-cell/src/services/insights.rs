use anyhow::Result;
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{EmotionSummary, PatientAlert, PatientEmotionBreakdown};
use crate::services::prediction::PredictionService;

/// Patients whose current negative run reaches this length are surfaced to
/// their doctor and to admin flags.
pub const ALERT_STREAK_THRESHOLD: usize = 3;

/// Derived views over the prediction log, scoped to whatever patient set the
/// caller is entitled to (a doctor's roster, or all patients for admins).
pub struct InsightService {
    supabase: SupabaseClient,
    predictions: PredictionService,
}

impl InsightService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            predictions: PredictionService::new(config),
        }
    }

    /// Patients in the given set with a current NEGATIVE streak at or above
    /// the threshold, strongest streak first.
    pub async fn alerts(
        &self,
        patient_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<PatientAlert>> {
        debug!("Scanning {} patients for negative streaks", patient_ids.len());

        let mut items = Vec::new();

        for patient_id in patient_ids {
            let samples = self.predictions.recent_for(patient_id, auth_token).await?;
            let streak = PredictionService::negative_streak(&samples);
            if streak < ALERT_STREAK_THRESHOLD {
                continue;
            }

            let Some(patient) = self.supabase.get_user_summary(patient_id, auth_token).await?
            else {
                continue;
            };

            items.push(PatientAlert {
                patient,
                streak,
                last_at: samples.first().map(|s| s.created_at),
            });
        }

        Self::sort_alerts(&mut items);
        Ok(items)
    }

    /// Per-patient emotion counts plus the aggregate across the set.
    pub async fn analytics(
        &self,
        patient_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<(EmotionSummary, Vec<PatientEmotionBreakdown>)> {
        let mut summary = EmotionSummary::default();
        let mut per_patient = Vec::new();

        for patient_id in patient_ids {
            let samples = self.predictions.recent_for(patient_id, auth_token).await?;

            let Some(patient) = self.supabase.get_user_summary(patient_id, auth_token).await?
            else {
                continue;
            };

            let mut counts = EmotionSummary::default();
            for s in &samples {
                counts.add(s.emotion);
                summary.add(s.emotion);
            }

            per_patient.push(PatientEmotionBreakdown {
                patient,
                negative: counts.negative,
                neutral: counts.neutral,
                positive: counts.positive,
                last_at: samples.first().map(|s| s.created_at),
            });
        }

        Ok((summary, per_patient))
    }

    /// Highest streak first; ties broken by most recent prediction.
    pub fn sort_alerts(items: &mut [PatientAlert]) {
        items.sort_by(|a, b| {
            b.streak
                .cmp(&a.streak)
                .then_with(|| b.last_at.cmp(&a.last_at))
        });
    }

    /// All patient ids in the store; admin flags scan globally.
    pub async fn all_patient_ids(&self, auth_token: &str) -> Result<Vec<Uuid>> {
        #[derive(serde::Deserialize)]
        struct IdRow {
            id: Uuid,
        }

        let rows: Vec<IdRow> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/users?role=eq.PATIENT&select=id",
                Some(auth_token),
                None,
            )
            .await?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }
}
