// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use notification_cell::models::NotificationType;
use notification_cell::services::NotificationService;

use crate::models::{
    Appointment, AppointmentError, AppointmentType, AppointmentWithOrganization,
    CreateAppointmentRequest, OrganizationSummary,
};

const DEFAULT_DURATION_MINUTES: i64 = 60;

const APPOINTMENT_WITH_ORG_SELECT: &str =
    "select=*,organization:organizations(id,name,created_by)";

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    notifications: NotificationService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let notifications = NotificationService::with_client(Arc::clone(&supabase));

        Self {
            supabase,
            notifications,
        }
    }

    /// Book an appointment into a resolved hour slot.
    ///
    /// Overlapping bookings into the same slot are allowed on purpose; there
    /// is no conflict check here. The notification fan-out afterwards is
    /// best-effort and never fails the booking.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment \"{}\" for organization {}",
            request.title, request.organization_id
        );

        if request.title.trim().is_empty() {
            return Err(AppointmentError::Validation("Invalid fields!".to_string()));
        }

        let duration_minutes = match request.appointment_type_id {
            Some(type_id) => {
                let appointment_type = self
                    .active_appointment_type(type_id, request.organization_id, auth_token)
                    .await?;
                appointment_type.duration_minutes as i64
            }
            None => DEFAULT_DURATION_MINUTES,
        };

        let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
            .map_err(|_| AppointmentError::Validation("Invalid date format!".to_string()))?;
        let hour = NaiveTime::parse_from_str(&request.hour, "%H:%M")
            .map_err(|_| AppointmentError::Validation("Invalid date format!".to_string()))?;

        let start_time = date.and_time(hour).and_utc();
        let end_time = start_time + ChronoDuration::minutes(duration_minutes);

        let organization = self
            .get_organization(request.organization_id, auth_token)
            .await?;

        let body = json!({
            "organization_id": request.organization_id,
            "appointment_type_id": request.appointment_type_id,
            "user_id": user.id,
            "title": request.title,
            "description": request.description,
            "start_time": start_time,
            "end_time": end_time,
            "status": "PENDING",
            "contact_name": request.contact_name,
            "contact_email": request.contact_email,
            "contact_phone": request.contact_phone,
            "notes": request.notes,
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
                "/rest/v1/appointments",
                Some(auth_token),
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let appointment: Appointment = result
            .first()
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?
            .ok_or_else(|| AppointmentError::Database("Failed to create appointment".to_string()))?;

        // Best-effort fan-out to the organization. A failure here must not
        // undo or fail the booking that already committed.
        let message = format!(
            "{} has created a new appointment \"{}\" on {} in {}.",
            user.display_name(),
            appointment.title,
            start_time.format("%Y-%m-%d %H:%M UTC"),
            organization.name
        );
        if let Err(e) = self
            .notifications
            .notify_organization(
                request.organization_id,
                Some(appointment.id),
                NotificationType::AppointmentCreated,
                "New Appointment Created",
                &message,
                auth_token,
            )
            .await
        {
            warn!(
                "Failed to send booking notifications for appointment {}: {}",
                appointment.id, e
            );
        }

        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentWithOrganization, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&{}",
            appointment_id, APPOINTMENT_WITH_ORG_SELECT
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result
            .first()
            .ok_or_else(|| AppointmentError::NotFound("Appointment not found!".to_string()))?;

        serde_json::from_value(row.clone())
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))
    }

    /// All appointments the actor has booked, newest first.
    pub async fn user_appointments(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&order=start_time.desc",
            user.id
        );
        self.fetch_appointments(&path, auth_token).await
    }

    /// The organization's full appointment book, for its owner or a
    /// platform admin.
    pub async fn organization_appointments(
        &self,
        organization_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let organization = self.get_organization(organization_id, auth_token).await?;
        if !user.is_admin() && organization.created_by.to_string() != user.id {
            return Err(AppointmentError::Permission(
                "You don't have permission to view this organization's appointments!".to_string(),
            ));
        }

        let path = format!(
            "/rest/v1/appointments?organization_id=eq.{}&order=start_time.asc",
            organization_id
        );
        self.fetch_appointments(&path, auth_token).await
    }

    pub async fn appointments_by_date(
        &self,
        organization_id: Uuid,
        date: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppointmentError::Validation("Invalid date format!".to_string()))?;

        let start_of_day = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let end_of_day = start_of_day + ChronoDuration::days(1);

        let path = format!(
            "/rest/v1/appointments?organization_id=eq.{}&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            organization_id,
            urlencoding::encode(&start_of_day.to_rfc3339()),
            urlencoding::encode(&end_of_day.to_rfc3339())
        );
        self.fetch_appointments(&path, auth_token).await
    }

    async fn fetch_appointments(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointments: {}", e)))
    }

    async fn active_appointment_type(
        &self,
        type_id: Uuid,
        organization_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentType, AppointmentError> {
        let path = format!(
            "/rest/v1/appointment_types?id=eq.{}&organization_id=eq.{}&is_active=eq.true",
            type_id, organization_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.first().ok_or_else(|| {
            AppointmentError::NotFound("Appointment type not found or inactive!".to_string())
        })?;

        serde_json::from_value(row.clone()).map_err(|e| {
            AppointmentError::Database(format!("Failed to parse appointment type: {}", e))
        })
    }

    async fn get_organization(
        &self,
        organization_id: Uuid,
        auth_token: &str,
    ) -> Result<OrganizationSummary, AppointmentError> {
        let path = format!(
            "/rest/v1/organizations?id=eq.{}&select=id,name,created_by",
            organization_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result
            .first()
            .ok_or_else(|| AppointmentError::NotFound("Organization not found!".to_string()))?;

        serde_json::from_value(row.clone()).map_err(|e| {
            AppointmentError::Database(format!("Failed to parse organization: {}", e))
        })
    }
}
