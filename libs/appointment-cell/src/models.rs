// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// No status change is allowed out of a completed appointment.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no show",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub appointment_type_id: Option<Uuid>,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Bookable service offered by an organization. Its duration drives the
/// appointment's end time at booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentType {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub color: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
}

/// Appointment joined with the owning organization, as the status
/// transition checks need both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithOrganization {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub organization: OrganizationSummary,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub organization_id: Uuid,
    pub appointment_type_id: Option<Uuid>,
    pub date: String,
    pub hour: String,
    pub title: String,
    pub description: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentTypeRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

// ==============================================================================
// ACTOR CAPABILITIES
// ==============================================================================

/// What one actor may do to one appointment. Computed in a single place so
/// the query side and the transition checks cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActorCapabilities {
    pub is_appointment_owner: bool,
    pub is_org_privileged: bool,
    pub can_confirm: bool,
    pub can_cancel: bool,
    pub can_complete: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Database(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::NotFound(msg) => AppError::NotFound(msg),
            AppointmentError::Permission(msg) => AppError::Permission(msg),
            AppointmentError::Conflict(msg) => AppError::Conflict(msg),
            AppointmentError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_to_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::NoShow).unwrap(),
            "\"NO_SHOW\""
        );
        assert_eq!(
            serde_json::from_str::<AppointmentStatus>("\"CANCELLED\"").unwrap(),
            AppointmentStatus::Cancelled
        );
    }

    #[test]
    fn test_completed_is_terminal() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(!AppointmentStatus::Cancelled.is_terminal());
        assert!(!AppointmentStatus::Pending.is_terminal());
    }
}
