use anyhow::Result;
use rand::Rng;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::user::UserSummary;

use crate::models::{DoctorRef, IdRef, PatientRef};

/// Care-team links between patients and doctors. Each patient carries at most
/// one assignment (`patient_id` unique in the store).
pub struct AssignmentService {
    supabase: SupabaseClient,
}

impl AssignmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn doctor_id_for_patient(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Option<Uuid>> {
        let path = format!(
            "/rest/v1/assignments?patient_id=eq.{}&select=doctor_id&limit=1",
            patient_id
        );

        let refs: Vec<DoctorRef> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(refs.into_iter().next().map(|r| r.doctor_id))
    }

    pub async fn patient_ids_for_doctor(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Uuid>> {
        let path = format!(
            "/rest/v1/assignments?doctor_id=eq.{}&select=patient_id",
            doctor_id
        );

        let refs: Vec<PatientRef> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(refs.into_iter().map(|r| r.patient_id).collect())
    }

    /// The caller's assigned doctor with their directory info attached.
    pub async fn assigned_doctor(
        &self,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Option<UserSummary>> {
        let Some(doctor_id) = self.doctor_id_for_patient(patient_id, auth_token).await? else {
            return Ok(None);
        };

        self.supabase.get_user_summary(&doctor_id, auth_token).await
    }

    pub async fn assigned_patients(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Vec<UserSummary>> {
        let patient_ids = self.patient_ids_for_doctor(doctor_id, auth_token).await?;

        let mut patients = Vec::with_capacity(patient_ids.len());
        for patient_id in patient_ids {
            if let Some(patient) = self.supabase.get_user_summary(&patient_id, auth_token).await? {
                patients.push(patient);
            }
        }

        Ok(patients)
    }

    /// Best-effort: pick a random doctor and link the patient. Insert errors
    /// are logged and ignored; an existing assignment wins via the store's
    /// conflict target.
    pub async fn assign_random(&self, patient_id: &str, auth_token: &str) -> Result<Option<Uuid>> {
        let doctors = self.list_doctor_ids(auth_token).await?;
        if doctors.is_empty() {
            debug!("No doctors available to assign patient {}", patient_id);
            return Ok(None);
        }

        let pick = doctors[rand::thread_rng().gen_range(0..doctors.len())];
        self.insert_assignment(patient_id, &pick, auth_token).await;

        Ok(Some(pick))
    }

    /// Assign every unassigned patient a random doctor. Returns the number of
    /// patients processed.
    pub async fn assign_all_unassigned(&self, auth_token: &str) -> Result<usize> {
        let doctors = self.list_doctor_ids(auth_token).await?;
        if doctors.is_empty() {
            return Ok(0);
        }

        let unassigned = self.unassigned_patients(auth_token).await?;
        let mut updated = 0;

        for patient in &unassigned {
            let pick = doctors[rand::thread_rng().gen_range(0..doctors.len())];
            self.insert_assignment(&patient.id.to_string(), &pick, auth_token)
                .await;
            updated += 1;
        }

        Ok(updated)
    }

    /// Patients with no assignment row, newest accounts first.
    pub async fn unassigned_patients(&self, auth_token: &str) -> Result<Vec<UserSummary>> {
        let patients: Vec<UserSummary> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/users?role=eq.PATIENT&select=id,name,email,employee_id,organization&order=created_at.desc&limit=500",
                Some(auth_token),
                None,
            )
            .await?;

        let assigned: Vec<PatientRef> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/assignments?select=patient_id",
                Some(auth_token),
                None,
            )
            .await?;
        let assigned_ids: Vec<Uuid> = assigned.into_iter().map(|r| r.patient_id).collect();

        Ok(Self::without_assignment(patients, &assigned_ids))
    }

    /// Set difference, preserving the incoming order.
    pub fn without_assignment(
        patients: Vec<UserSummary>,
        assigned_ids: &[Uuid],
    ) -> Vec<UserSummary> {
        patients
            .into_iter()
            .filter(|p| !assigned_ids.contains(&p.id))
            .collect()
    }

    async fn list_doctor_ids(&self, auth_token: &str) -> Result<Vec<Uuid>> {
        let doctors: Vec<IdRef> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/users?role=eq.DOCTOR&select=id",
                Some(auth_token),
                None,
            )
            .await?;

        Ok(doctors.into_iter().map(|d| d.id).collect())
    }

    async fn insert_assignment(&self, patient_id: &str, doctor_id: &Uuid, auth_token: &str) {
        let assignment_data = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=ignore-duplicates,return=representation",
            ),
        );

        let result: Result<Vec<Value>> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/assignments?on_conflict=patient_id",
                Some(auth_token),
                Some(assignment_data),
                Some(headers),
            )
            .await;

        if let Err(e) = result {
            warn!(
                "Failed to assign patient {} to doctor {}: {}",
                patient_id, doctor_id, e
            );
        }
    }
}
