// libs/notification-cell/src/services/notify.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{Notification, NotificationError, NotificationType};

pub struct NotificationService {
    supabase: Arc<SupabaseClient>,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Fan a notification out to the organization owner and every member.
    ///
    /// Recipients are deduplicated so an owner who is also listed as a
    /// member gets one row, not two.
    pub async fn notify_organization(
        &self,
        organization_id: Uuid,
        appointment_id: Option<Uuid>,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        debug!("Notifying organization {} ({})", organization_id, title);

        let org_path = format!(
            "/rest/v1/organizations?id=eq.{}&select=id,created_by",
            organization_id
        );
        let orgs: Vec<Value> = self
            .supabase
            .request(Method::GET, &org_path, Some(auth_token), None)
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        let org = orgs
            .first()
            .ok_or_else(|| NotificationError::NotFound("Organization not found!".to_string()))?;

        let members_path = format!(
            "/rest/v1/organization_members?organization_id=eq.{}&select=user_id",
            organization_id
        );
        let members: Vec<Value> = self
            .supabase
            .request(Method::GET, &members_path, Some(auth_token), None)
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        let mut recipient_ids: Vec<String> = Vec::new();
        if let Some(owner_id) = org.get("created_by").and_then(|v| v.as_str()) {
            recipient_ids.push(owner_id.to_string());
        }
        for member in &members {
            if let Some(user_id) = member.get("user_id").and_then(|v| v.as_str()) {
                if !recipient_ids.iter().any(|id| id == user_id) {
                    recipient_ids.push(user_id.to_string());
                }
            }
        }

        if recipient_ids.is_empty() {
            return Ok(());
        }

        let rows: Vec<Value> = recipient_ids
            .iter()
            .map(|user_id| {
                json!({
                    "user_id": user_id,
                    "organization_id": organization_id,
                    "appointment_id": appointment_id,
                    "type": notification_type,
                    "title": title,
                    "message": message,
                    "read": false,
                })
            })
            .collect();

        let _: Vec<Value> = self
            .supabase
            .request(
                Method::POST,
                "/rest/v1/notifications",
                Some(auth_token),
                Some(json!(rows)),
            )
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(())
    }

    /// Notify a single user.
    pub async fn notify_user(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        appointment_id: Option<Uuid>,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        debug!("Notifying user {} ({})", user_id, title);

        let body = json!([{
            "user_id": user_id,
            "organization_id": organization_id,
            "appointment_id": appointment_id,
            "type": notification_type,
            "title": title,
            "message": message,
            "read": false,
        }]);

        let _: Vec<Value> = self
            .supabase
            .request(
                Method::POST,
                "/rest/v1/notifications",
                Some(auth_token),
                Some(body),
            )
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn list_for_user(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Notification>, NotificationError> {
        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&order=created_at.desc",
            user.id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Notification>, _>>()
            .map_err(|e| NotificationError::Database(format!("Failed to parse notifications: {}", e)))
    }

    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        read: bool,
        user: &User,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        self.ensure_owned(notification_id, user, auth_token).await?;

        let read_at = if read {
            json!(chrono::Utc::now())
        } else {
            Value::Null
        };

        let path = format!("/rest/v1/notifications?id=eq.{}", notification_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "read": read, "read_at": read_at })),
                Some(headers),
            )
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        let row = result
            .first()
            .ok_or_else(|| NotificationError::NotFound("Notification not found!".to_string()))?;

        serde_json::from_value(row.clone())
            .map_err(|e| NotificationError::Database(format!("Failed to parse notification: {}", e)))
    }

    /// Mark every unread notification for the user as read. Returns how many
    /// rows changed.
    pub async fn mark_all_read(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<usize, NotificationError> {
        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&read=eq.false",
            user.id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "read": true, "read_at": chrono::Utc::now() })),
                Some(headers),
            )
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(result.len())
    }

    pub async fn delete(
        &self,
        notification_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        self.ensure_owned(notification_id, user, auth_token).await?;

        let path = format!("/rest/v1/notifications?id=eq.{}", notification_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(headers))
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(())
    }

    async fn ensure_owned(
        &self,
        notification_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        let path = format!(
            "/rest/v1/notifications?id=eq.{}&select=user_id",
            notification_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        let row = result
            .first()
            .ok_or_else(|| NotificationError::NotFound("Notification not found!".to_string()))?;

        let owner = row.get("user_id").and_then(|v| v.as_str()).unwrap_or("");
        if owner != user.id {
            return Err(NotificationError::Permission(
                "This notification does not belong to you.".to_string(),
            ));
        }

        Ok(())
    }
}
