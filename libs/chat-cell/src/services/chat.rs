use anyhow::{anyhow, Result};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use assignment_cell::services::AssignmentService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{ChatError, Conversation, Message, MessagePreview, ThreadItem};

/// Direct messaging between a patient and their assigned doctor.
/// Conversations are created lazily the first time either side opens the
/// thread list.
pub struct ChatService {
    supabase: SupabaseClient,
    assignments: AssignmentService,
}

impl ChatService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            assignments: AssignmentService::new(config),
        }
    }

    pub async fn threads_for(&self, caller: &User, auth_token: &str) -> Result<Vec<ThreadItem>> {
        if caller.is_doctor() {
            return self.doctor_threads(caller, auth_token).await;
        }
        self.patient_threads(caller, auth_token).await
    }

    /// A patient has exactly one thread: their assigned doctor. Unassigned
    /// patients get a random doctor best-effort, matching the portal's
    /// first-contact behavior.
    async fn patient_threads(&self, caller: &User, auth_token: &str) -> Result<Vec<ThreadItem>> {
        let doctor_id = match self
            .assignments
            .doctor_id_for_patient(&caller.id, auth_token)
            .await?
        {
            Some(id) => Some(id),
            None => self.assignments.assign_random(&caller.id, auth_token).await?,
        };

        let Some(doctor_id) = doctor_id else {
            debug!("Patient {} has no doctor to chat with", caller.id);
            return Ok(vec![]);
        };

        let conversation = self
            .ensure_conversation(&caller.id, &doctor_id, auth_token)
            .await?;

        let Some(peer) = self.supabase.get_user_summary(&doctor_id, auth_token).await? else {
            return Ok(vec![]);
        };

        let last = self.last_message(&conversation.id, auth_token).await?;

        Ok(vec![ThreadItem {
            conversation_id: conversation.id,
            peer,
            last,
        }])
    }

    /// One thread per assigned patient, most recently active first.
    async fn doctor_threads(&self, caller: &User, auth_token: &str) -> Result<Vec<ThreadItem>> {
        let patient_ids = self
            .assignments
            .patient_ids_for_doctor(&caller.id, auth_token)
            .await?;

        let doctor_id = Uuid::parse_str(&caller.id)?;
        let mut items = Vec::with_capacity(patient_ids.len());

        for patient_id in patient_ids {
            let Some(peer) = self.supabase.get_user_summary(&patient_id, auth_token).await?
            else {
                continue;
            };

            let conversation = self
                .ensure_conversation(&patient_id.to_string(), &doctor_id, auth_token)
                .await?;
            let last = self.last_message(&conversation.id, auth_token).await?;

            items.push(ThreadItem {
                conversation_id: conversation.id,
                peer,
                last,
            });
        }

        Self::sort_threads(&mut items);
        Ok(items)
    }

    pub async fn messages(
        &self,
        conversation_id: &Uuid,
        auth_token: &str,
    ) -> Result<Vec<Message>> {
        let path = format!(
            "/rest/v1/messages?conversation_id=eq.{}&order=created_at.asc",
            conversation_id
        );

        let messages: Vec<Message> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(messages)
    }

    /// Append a message; the sender must be one of the conversation's two
    /// participants.
    pub async fn send(
        &self,
        sender: &User,
        conversation_id: &Uuid,
        text: &str,
        auth_token: &str,
    ) -> Result<Message, ChatError> {
        let conversation = self
            .get_conversation(conversation_id, auth_token)
            .await
            .map_err(|e| ChatError::Database(e.to_string()))?
            .ok_or(ChatError::NotFound)?;

        let sender_id =
            Uuid::parse_str(&sender.id).map_err(|e| ChatError::Database(e.to_string()))?;
        if conversation.patient_id != sender_id && conversation.doctor_id != sender_id {
            return Err(ChatError::Forbidden);
        }

        let message_data = json!({
            "conversation_id": conversation.id,
            "sender_id": sender_id,
            "text": text
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Message> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/messages",
                Some(auth_token),
                Some(message_data),
                Some(headers),
            )
            .await
            .map_err(|e| ChatError::Database(e.to_string()))?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Database("Failed to send message".to_string()))
    }

    /// Most recently active threads first; never-used threads sink to the end.
    pub fn sort_threads(items: &mut [ThreadItem]) {
        items.sort_by(|a, b| {
            let a_at = a.last.as_ref().map(|l| l.created_at);
            let b_at = b.last.as_ref().map(|l| l.created_at);
            b_at.cmp(&a_at)
        });
    }

    async fn ensure_conversation(
        &self,
        patient_id: &str,
        doctor_id: &Uuid,
        auth_token: &str,
    ) -> Result<Conversation> {
        let path = format!(
            "/rest/v1/conversations?patient_id=eq.{}&doctor_id=eq.{}&limit=1",
            patient_id, doctor_id
        );

        let existing: Vec<Conversation> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        if let Some(conversation) = existing.into_iter().next() {
            return Ok(conversation);
        }

        let conversation_data = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Vec<Conversation> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/conversations",
                Some(auth_token),
                Some(conversation_data),
                Some(headers),
            )
            .await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create conversation"))
    }

    async fn get_conversation(
        &self,
        conversation_id: &Uuid,
        auth_token: &str,
    ) -> Result<Option<Conversation>> {
        let path = format!("/rest/v1/conversations?id=eq.{}&limit=1", conversation_id);

        let conversations: Vec<Conversation> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(conversations.into_iter().next())
    }

    async fn last_message(
        &self,
        conversation_id: &Uuid,
        auth_token: &str,
    ) -> Result<Option<MessagePreview>> {
        let path = format!(
            "/rest/v1/messages?conversation_id=eq.{}&select=text,created_at&order=created_at.desc&limit=1",
            conversation_id
        );

        let previews: Vec<MessagePreview> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(previews.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared_models::user::UserSummary;

    fn thread(minute: Option<u32>) -> ThreadItem {
        ThreadItem {
            conversation_id: Uuid::new_v4(),
            peer: UserSummary {
                id: Uuid::new_v4(),
                name: None,
                email: "peer@example.com".to_string(),
                employee_id: None,
                organization: None,
            },
            last: minute.map(|m| MessagePreview {
                text: "hi".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, m, 0).unwrap(),
            }),
        }
    }

    #[test]
    fn threads_sort_by_latest_activity() {
        let mut items = vec![thread(Some(5)), thread(None), thread(Some(30))];

        ChatService::sort_threads(&mut items);

        assert_eq!(items[0].last.as_ref().unwrap().text, "hi");
        assert!(items[0].last.as_ref().unwrap().created_at
            > items[1].last.as_ref().unwrap().created_at);
        assert!(items[2].last.is_none());
    }
}
