use std::collections::HashMap;

use anyhow::Result;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use booking_cell::models::Meeting;
use prediction_cell::models::{Emotion, EmotionSummary, PatientAlert};
use prediction_cell::services::InsightService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::user::{Role, UserSummary};

use crate::models::{MeetingExportRecord, PredictionAggregate, PredictionExportRow, RoleCounts};

/// Portal-wide reporting for administrators: emotion aggregates, negative
/// streak flags, and record exports.
pub struct ReportService {
    supabase: SupabaseClient,
    insights: InsightService,
}

impl ReportService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            insights: InsightService::new(config),
        }
    }

    /// Global prediction summary plus user counts by role. Aggregation runs
    /// in memory over column projections, the same shape the per-doctor
    /// analytics use.
    pub async fn global_analytics(
        &self,
        auth_token: &str,
    ) -> Result<(EmotionSummary, RoleCounts)> {
        #[derive(Deserialize)]
        struct EmotionRow {
            emotion: Emotion,
        }

        #[derive(Deserialize)]
        struct RoleRow {
            role: Role,
        }

        let predictions: Vec<EmotionRow> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/predictions?select=emotion",
                Some(auth_token),
                None,
            )
            .await?;

        let mut summary = EmotionSummary::default();
        for row in &predictions {
            summary.add(row.emotion);
        }

        let users: Vec<RoleRow> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/users?select=role",
                Some(auth_token),
                None,
            )
            .await?;

        let mut counts = RoleCounts::default();
        for row in &users {
            counts.add(row.role);
        }

        Ok((summary, counts))
    }

    /// Negative-streak flags across every patient in the portal.
    pub async fn global_flags(&self, auth_token: &str) -> Result<Vec<PatientAlert>> {
        let patient_ids = self.insights.all_patient_ids(auth_token).await?;
        self.insights.alerts(&patient_ids, auth_token).await
    }

    /// All meetings, newest start first, with both parties attached.
    pub async fn export_meetings(&self, auth_token: &str) -> Result<Vec<MeetingExportRecord>> {
        let meetings: Vec<Meeting> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/meetings?order=start_time.desc",
                Some(auth_token),
                None,
            )
            .await?;

        debug!("Exporting {} meeting records", meetings.len());

        let mut cache: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
        let mut records = Vec::with_capacity(meetings.len());

        for meeting in meetings {
            let patient = self
                .cached_summary(&mut cache, &meeting.patient_id, auth_token)
                .await?;
            let doctor = self
                .cached_summary(&mut cache, &meeting.provider_id, auth_token)
                .await?;

            records.push(MeetingExportRecord {
                meeting,
                patient,
                doctor,
            });
        }

        Ok(records)
    }

    /// Per-patient prediction aggregates, busiest patients first.
    pub async fn prediction_aggregates(
        &self,
        auth_token: &str,
    ) -> Result<Vec<PredictionAggregate>> {
        let rows: Vec<PredictionExportRow> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/predictions?select=patient_id,emotion,created_at",
                Some(auth_token),
                None,
            )
            .await?;

        Ok(Self::aggregate_predictions(rows))
    }

    /// Fold rows into per-patient counts; total desc so heavy users surface.
    pub fn aggregate_predictions(rows: Vec<PredictionExportRow>) -> Vec<PredictionAggregate> {
        let mut by_patient: HashMap<Uuid, PredictionAggregate> = HashMap::new();

        for row in rows {
            let entry = by_patient
                .entry(row.patient_id)
                .or_insert_with(|| PredictionAggregate {
                    patient_id: row.patient_id,
                    negative: 0,
                    neutral: 0,
                    positive: 0,
                    total: 0,
                    last_at: None,
                });

            entry.total += 1;
            match row.emotion {
                Emotion::Negative => entry.negative += 1,
                Emotion::Neutral => entry.neutral += 1,
                Emotion::Positive => entry.positive += 1,
            }
            if entry.last_at.map_or(true, |seen| row.created_at > seen) {
                entry.last_at = Some(row.created_at);
            }
        }

        let mut aggregates: Vec<PredictionAggregate> = by_patient.into_values().collect();
        aggregates.sort_by(|a, b| b.total.cmp(&a.total));
        aggregates
    }

    async fn cached_summary(
        &self,
        cache: &mut HashMap<Uuid, Option<UserSummary>>,
        user_id: &Uuid,
        auth_token: &str,
    ) -> Result<Option<UserSummary>> {
        if let Some(found) = cache.get(user_id) {
            return Ok(found.clone());
        }

        let found = self.supabase.get_user_summary(user_id, auth_token).await?;
        cache.insert(*user_id, found.clone());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(patient: Uuid, emotion: Emotion, day: u32) -> PredictionExportRow {
        PredictionExportRow {
            patient_id: patient,
            emotion,
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn aggregation_counts_and_tracks_latest() {
        let busy = Uuid::new_v4();
        let quiet = Uuid::new_v4();

        let rows = vec![
            row(busy, Emotion::Negative, 1),
            row(busy, Emotion::Negative, 3),
            row(busy, Emotion::Positive, 2),
            row(quiet, Emotion::Neutral, 5),
        ];

        let aggregates = ReportService::aggregate_predictions(rows);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].patient_id, busy);
        assert_eq!(aggregates[0].negative, 2);
        assert_eq!(aggregates[0].positive, 1);
        assert_eq!(aggregates[0].total, 3);
        assert_eq!(
            aggregates[0].last_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap())
        );
        assert_eq!(aggregates[1].total, 1);
    }

    #[test]
    fn aggregation_of_no_rows_is_empty() {
        assert!(ReportService::aggregate_predictions(vec![]).is_empty());
    }
}
