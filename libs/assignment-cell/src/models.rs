use serde::Deserialize;
use uuid::Uuid;

/// Column projections used by assignment lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorRef {
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientRef {
    pub patient_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: Uuid,
}
