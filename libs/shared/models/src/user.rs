use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "PATIENT"),
            Role::Doctor => write!(f, "DOCTOR"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Full row from the `users` table. Optional columns stay optional here so
/// partially filled profiles round-trip untouched. Deserialized from the
/// store's snake_case columns, serialized with the portal's camelCase names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(rename = "employeeId", alias = "employee_id", default)]
    pub employee_id: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    #[serde(rename = "specialCondition", alias = "special_condition", default)]
    pub special_condition: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "shareReports", alias = "share_reports", default)]
    pub share_reports: Option<bool>,
    #[serde(rename = "profileImageUrl", alias = "profile_image_url", default)]
    pub profile_image_url: Option<String>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Trimmed user projection attached to meetings, chat threads, assignment
/// listings, and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    #[serde(rename = "employeeId", alias = "employee_id", skip_serializing_if = "Option::is_none", default)]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub organization: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Role::Doctor).unwrap(), json!("DOCTOR"));
        let parsed: Role = serde_json::from_value(json!("PATIENT")).unwrap();
        assert_eq!(parsed, Role::Patient);
    }

    #[test]
    fn user_summary_omits_absent_optional_columns() {
        let summary = UserSummary {
            id: Uuid::new_v4(),
            name: Some("Ana".to_string()),
            email: "ana@example.com".to_string(),
            employee_id: None,
            organization: None,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("employeeId").is_none());
        assert!(value.get("organization").is_none());
    }
}
