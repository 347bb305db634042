use anyhow::{anyhow, Result};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::user::UserRecord;

use crate::models::UpdateProfileRequest;

pub struct ProfileService {
    supabase: SupabaseClient,
}

impl ProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_profile(&self, user_id: &str, auth_token: &str) -> Result<Option<UserRecord>> {
        debug!("Fetching profile for user: {}", user_id);
        self.supabase.get_user_record(user_id, auth_token).await
    }

    /// Apply the provided fields and record a PROFILE_UPDATED activity entry.
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
        auth_token: &str,
    ) -> Result<UserRecord> {
        debug!("Updating profile for user: {}", user_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = &request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(gender) = &request.gender {
            update_data.insert("gender".to_string(), json!(gender));
        }
        if let Some(age) = request.age {
            update_data.insert("age".to_string(), json!(age));
        }
        if let Some(height) = request.height {
            update_data.insert("height".to_string(), json!(height));
        }
        if let Some(weight) = request.weight {
            update_data.insert("weight".to_string(), json!(weight));
        }
        if let Some(special_condition) = &request.special_condition {
            update_data.insert("special_condition".to_string(), json!(special_condition));
        }
        if let Some(address) = &request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(share_reports) = request.share_reports {
            update_data.insert("share_reports".to_string(), json!(share_reports));
        }
        if let Some(profile_image_url) = &request.profile_image_url {
            update_data.insert("profile_image_url".to_string(), json!(profile_image_url));
        }

        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<UserRecord> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(headers),
            )
            .await?;

        let updated = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to update profile"))?;

        self.log_activity(user_id, "PROFILE_UPDATED", &request, auth_token)
            .await?;

        Ok(updated)
    }

    async fn log_activity(
        &self,
        user_id: &str,
        action: &str,
        request: &UpdateProfileRequest,
        auth_token: &str,
    ) -> Result<()> {
        let entry = json!({
            "user_id": user_id,
            "action": action,
            "details": serde_json::to_string(request)?,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/activity_logs",
                Some(auth_token),
                Some(entry),
                Some(headers),
            )
            .await?;

        Ok(())
    }
}
