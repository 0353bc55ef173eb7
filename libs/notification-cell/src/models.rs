// libs/notification-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    AppointmentCreated,
    AppointmentConfirmed,
    AppointmentCancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub appointment_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkReadRequest {
    pub read: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    Database(String),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound(msg) => AppError::NotFound(msg),
            NotificationError::Permission(msg) => AppError::Permission(msg),
            NotificationError::Database(msg) => AppError::Database(msg),
        }
    }
}
