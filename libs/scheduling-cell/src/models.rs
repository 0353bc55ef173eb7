// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOfWeek::Monday => write!(f, "MONDAY"),
            DayOfWeek::Tuesday => write!(f, "TUESDAY"),
            DayOfWeek::Wednesday => write!(f, "WEDNESDAY"),
            DayOfWeek::Thursday => write!(f, "THURSDAY"),
            DayOfWeek::Friday => write!(f, "FRIDAY"),
            DayOfWeek::Saturday => write!(f, "SATURDAY"),
            DayOfWeek::Sunday => write!(f, "SUNDAY"),
        }
    }
}

/// One recurring weekly open-hours window. At most one row exists per
/// (organization, weekday); the full-replace RPC enforces that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
}

impl WeeklyAvailability {
    pub fn start(&self) -> Result<NaiveTime, SchedulingError> {
        parse_hhmm(&self.start_time)
    }

    pub fn end(&self) -> Result<NaiveTime, SchedulingError> {
        parse_hhmm(&self.end_time)
    }
}

/// Full-day blackout for a specific calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnavailableDate {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

/// Appointment fields the slot resolver needs. The appointment cell owns
/// the full record; this is the read-side view for day occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedAppointment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyAvailabilityEntry {
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceWeeklyAvailabilityRequest {
    pub availabilities: Vec<WeeklyAvailabilityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnavailableDateRequest {
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatus {
    pub available: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourSlot {
    pub time: String,
    pub appointments: Vec<BookedAppointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub available: bool,
    pub reason: Option<String>,
    pub slots: Vec<HourSlot>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Validation(msg) => AppError::ValidationError(msg),
            SchedulingError::NotFound(msg) => AppError::NotFound(msg),
            SchedulingError::Permission(msg) => AppError::Permission(msg),
            SchedulingError::Conflict(msg) => AppError::Conflict(msg),
            SchedulingError::Database(msg) => AppError::Database(msg),
        }
    }
}

pub(crate) fn parse_hhmm(value: &str) -> Result<NaiveTime, SchedulingError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| SchedulingError::Validation(format!("Invalid time format: {}", value)))
}
