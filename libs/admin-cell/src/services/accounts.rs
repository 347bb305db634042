use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::user::{Role, UserRecord};

use crate::models::AccountError;

/// Admin-side user administration: directory listing and credential resets.
pub struct AccountService {
    supabase: SupabaseClient,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Newest accounts first, optionally filtered by role. Capped at 200 rows
    /// like the portal's admin directory.
    pub async fn list_users(
        &self,
        role: Option<Role>,
        auth_token: &str,
    ) -> Result<Vec<UserRecord>, AccountError> {
        let mut path = "/rest/v1/users?order=created_at.desc&limit=200".to_string();
        if let Some(role) = role {
            path.push_str(&format!("&role=eq.{}", role));
        }

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))
    }

    /// Replace a user's credential hash. Email lookup is case-insensitive to
    /// match how accounts are keyed at sign-in.
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        auth_token: &str,
    ) -> Result<(), AccountError> {
        let normalized = email.to_lowercase();
        debug!("Resetting password for {}", normalized);

        #[derive(Deserialize)]
        struct IdRow {
            id: Uuid,
        }

        let path = format!("/rest/v1/users?email=eq.{}&select=id&limit=1", normalized);
        let rows: Vec<IdRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        let user = rows.into_iter().next().ok_or(AccountError::UserNotFound)?;

        let password_hash = hash_password(new_password)?;

        let credential_data = json!({
            "user_id": user.id,
            "password_hash": password_hash
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static(
                "resolution=merge-duplicates,return=representation",
            ),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/user_credentials?on_conflict=user_id",
                Some(auth_token),
                Some(credential_data),
                Some(headers),
            )
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        info!("Password reset for user {}", user.id);
        Ok(())
    }
}

pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::Hash(e.to_string()))?;

    Ok(password_hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn hashed_password_verifies_and_salts_differ() {
        let first = hash_password("correct horse battery staple").unwrap();
        let second = hash_password("correct horse battery staple").unwrap();
        assert_ne!(first, second);

        let parsed = PasswordHash::new(&first).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse battery staple", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong password", &parsed)
            .is_err());
    }
}
