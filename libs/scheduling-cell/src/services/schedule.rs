// libs/scheduling-cell/src/services/schedule.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{is_conflict_error, SupabaseClient};
use shared_models::auth::User;

use crate::models::{
    parse_hhmm, BookedAppointment, CreateUnavailableDateRequest, DaySchedule, HourSlot,
    ReplaceWeeklyAvailabilityRequest, SchedulingError, UnavailableDate, WeeklyAvailability,
};
use crate::services::slots;

pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    // ==========================================================================
    // WEEKLY AVAILABILITY
    // ==========================================================================

    pub async fn list_weekly_availability(
        &self,
        organization_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<WeeklyAvailability>, SchedulingError> {
        debug!("Fetching weekly availability for organization {}", organization_id);

        let path = format!(
            "/rest/v1/weekly_availability?organization_id=eq.{}&order=day_of_week.asc",
            organization_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<WeeklyAvailability>, _>>()
            .map_err(|e| SchedulingError::Database(format!("Failed to parse availability: {}", e)))
    }

    /// Atomically replace the organization's whole weekly schedule.
    ///
    /// Delete-all-then-insert runs inside one Postgres function so no reader
    /// can observe the schedule between the delete and the insert.
    pub async fn replace_weekly_availability(
        &self,
        organization_id: Uuid,
        request: ReplaceWeeklyAvailabilityRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Replacing weekly availability for organization {} with {} entries",
            organization_id,
            request.availabilities.len()
        );

        self.ensure_member(organization_id, user, auth_token).await?;

        let mut seen = Vec::new();
        for entry in &request.availabilities {
            let start = parse_hhmm(&entry.start_time)?;
            let end = parse_hhmm(&entry.end_time)?;
            if start >= end {
                return Err(SchedulingError::Validation(
                    "Start time must be before end time".to_string(),
                ));
            }
            if seen.contains(&entry.day_of_week) {
                return Err(SchedulingError::Validation(format!(
                    "Duplicate entry for {}",
                    entry.day_of_week
                )));
            }
            seen.push(entry.day_of_week);
        }

        let entries: Vec<Value> = request
            .availabilities
            .iter()
            .map(|entry| {
                json!({
                    "day_of_week": entry.day_of_week,
                    "start_time": entry.start_time,
                    "end_time": entry.end_time,
                })
            })
            .collect();

        self.supabase
            .rpc(
                "replace_weekly_availability",
                Some(auth_token),
                json!({
                    "org_id": organization_id,
                    "entries": entries,
                }),
            )
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        Ok(())
    }

    pub async fn delete_weekly_availability(
        &self,
        availability_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        debug!("Deleting weekly availability {}", availability_id);

        let path = format!("/rest/v1/weekly_availability?id=eq.{}", availability_id);
        let existing: Vec<WeeklyAvailability> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        let entry = existing
            .first()
            .ok_or_else(|| SchedulingError::NotFound("Weekly availability not found.".to_string()))?;

        self.ensure_member(entry.organization_id, user, auth_token).await?;

        self.delete_row("weekly_availability", availability_id, auth_token).await
    }

    // ==========================================================================
    // UNAVAILABLE DATES
    // ==========================================================================

    pub async fn list_unavailable_dates(
        &self,
        organization_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<UnavailableDate>, SchedulingError> {
        let path = format!(
            "/rest/v1/unavailable_dates?organization_id=eq.{}&order=date.asc",
            organization_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<UnavailableDate>, _>>()
            .map_err(|e| SchedulingError::Database(format!("Failed to parse unavailable dates: {}", e)))
    }

    pub async fn create_unavailable_date(
        &self,
        organization_id: Uuid,
        request: CreateUnavailableDateRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<UnavailableDate, SchedulingError> {
        debug!(
            "Creating unavailable date {} for organization {}",
            request.date, organization_id
        );

        self.ensure_member(organization_id, user, auth_token).await?;

        let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
            .map_err(|_| SchedulingError::Validation("Invalid date format!".to_string()))?;

        // Pre-check for a friendlier message; the unique constraint still
        // backstops a concurrent insert.
        let existing_path = format!(
            "/rest/v1/unavailable_dates?organization_id=eq.{}&date=eq.{}",
            organization_id, date
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        if !existing.is_empty() {
            return Err(SchedulingError::Conflict(
                "This date is already marked as unavailable.".to_string(),
            ));
        }

        let body = json!({
            "organization_id": organization_id,
            "date": date,
            "reason": request.reason,
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/unavailable_dates",
                Some(auth_token),
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| {
                if is_conflict_error(&e) {
                    SchedulingError::Conflict(
                        "This date is already marked as unavailable.".to_string(),
                    )
                } else {
                    SchedulingError::Database(e.to_string())
                }
            })?;

        let row = result
            .first()
            .ok_or_else(|| SchedulingError::Database("Failed to create unavailable date".to_string()))?;

        serde_json::from_value(row.clone())
            .map_err(|e| SchedulingError::Database(format!("Failed to parse unavailable date: {}", e)))
    }

    pub async fn delete_unavailable_date(
        &self,
        unavailable_date_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        debug!("Deleting unavailable date {}", unavailable_date_id);

        let path = format!("/rest/v1/unavailable_dates?id=eq.{}", unavailable_date_id);
        let existing: Vec<UnavailableDate> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        let entry = existing
            .first()
            .ok_or_else(|| SchedulingError::NotFound("Unavailable date not found.".to_string()))?;

        self.ensure_member(entry.organization_id, user, auth_token).await?;

        self.delete_row("unavailable_dates", unavailable_date_id, auth_token).await
    }

    // ==========================================================================
    // DAY SCHEDULE
    // ==========================================================================

    /// Resolve the hour-by-hour view for one calendar date: day status from
    /// rules and blackouts, then per-slot occupancy from booked appointments.
    pub async fn day_schedule(
        &self,
        organization_id: Uuid,
        date: &str,
        auth_token: &str,
    ) -> Result<DaySchedule, SchedulingError> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| SchedulingError::Validation("Invalid date format!".to_string()))?;

        let rules = self.list_weekly_availability(organization_id, auth_token).await?;
        let overrides = self.list_unavailable_dates(organization_id, auth_token).await?;

        let status = slots::resolve_day_status(&rules, &overrides, date);
        if !status.available {
            return Ok(DaySchedule {
                date,
                available: false,
                reason: status.reason,
                slots: Vec::new(),
            });
        }

        let appointments = self
            .appointments_for_date(organization_id, date, auth_token)
            .await?;

        let hour_slots = slots::generate_hour_slots(&rules, date)?
            .into_iter()
            .map(|slot| HourSlot {
                time: slot.format("%H:%M").to_string(),
                appointments: slots::appointments_in_slot(&appointments, date, slot)
                    .into_iter()
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(DaySchedule {
            date,
            available: true,
            reason: None,
            slots: hour_slots,
        })
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    async fn appointments_for_date(
        &self,
        organization_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BookedAppointment>, SchedulingError> {
        let start_of_day = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| SchedulingError::Validation("Invalid date format!".to_string()))?;
        let end_of_day = start_of_day + chrono::Duration::days(1);

        let path = format!(
            "/rest/v1/appointments?organization_id=eq.{}&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            organization_id,
            urlencoding::encode(&start_of_day.to_rfc3339()),
            urlencoding::encode(&end_of_day.to_rfc3339())
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<BookedAppointment>, _>>()
            .map_err(|e| SchedulingError::Database(format!("Failed to parse appointments: {}", e)))
    }

    async fn ensure_member(
        &self,
        organization_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        let path = format!(
            "/rest/v1/organization_members?organization_id=eq.{}&user_id=eq.{}",
            organization_id, user.id
        );
        let members: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        if members.is_empty() {
            warn!(
                "User {} attempted to manage availability for organization {} without membership",
                user.id, organization_id
            );
            return Err(SchedulingError::Permission(
                "You are not a member of this organization.".to_string(),
            ));
        }

        Ok(())
    }

    async fn delete_row(
        &self,
        table: &str,
        id: Uuid,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(headers))
            .await
            .map_err(|e| SchedulingError::Database(e.to_string()))?;

        Ok(())
    }
}
