// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

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
    ActorCapabilities, AppointmentError, AppointmentStatus, AppointmentWithOrganization,
    UpdateStatusRequest,
};
use crate::services::booking::BookingService;

/// Compute everything an actor may do to an appointment in one place, so
/// the UI enablement query and the transition gate use the same answer.
///
/// Organization owners and platform admins may confirm and complete;
/// cancellation is additionally open to the user who booked.
pub fn actor_capabilities(user: &User, appointment: &AppointmentWithOrganization) -> ActorCapabilities {
    let is_appointment_owner = appointment.appointment.user_id.to_string() == user.id;
    let is_org_owner = appointment.organization.created_by.to_string() == user.id;
    let is_org_privileged = is_org_owner || user.is_admin();

    ActorCapabilities {
        is_appointment_owner,
        is_org_privileged,
        can_confirm: is_org_privileged,
        can_cancel: is_org_privileged || is_appointment_owner,
        can_complete: is_org_privileged,
    }
}

pub struct StatusTransitionService {
    supabase: Arc<SupabaseClient>,
    booking: BookingService,
    notifications: NotificationService,
}

impl StatusTransitionService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let notifications = NotificationService::with_client(Arc::clone(&supabase));

        Self {
            supabase,
            booking: BookingService::new(config),
            notifications,
        }
    }

    /// Move an appointment to a new status, enforcing the transition table.
    ///
    /// Completed appointments are terminal. Cancellation needs a reason and
    /// is the only transition open to the booking user; everything else is
    /// reserved for the organization owner or a platform admin.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<AppointmentWithOrganization, AppointmentError> {
        info!(
            "Updating appointment {} status to {:?}",
            appointment_id, request.status
        );

        let appointment = self.booking.get_appointment(appointment_id, auth_token).await?;
        let caps = actor_capabilities(user, &appointment);

        match request.status {
            AppointmentStatus::Cancelled => {
                if !caps.can_cancel {
                    return Err(AppointmentError::Permission(
                        "You don't have permission to cancel this appointment!".to_string(),
                    ));
                }
            }
            _ => {
                if !caps.is_org_privileged {
                    return Err(AppointmentError::Permission(
                        "You don't have permission to update this appointment!".to_string(),
                    ));
                }
            }
        }

        let cancellation_reason = match request.status {
            AppointmentStatus::Cancelled => {
                let reason = request
                    .cancellation_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty());
                Some(
                    reason
                        .ok_or_else(|| {
                            AppointmentError::Validation(
                                "Cancellation reason is required!".to_string(),
                            )
                        })?
                        .to_string(),
                )
            }
            _ => None,
        };

        if appointment.appointment.status == request.status {
            return Err(AppointmentError::Conflict(format!(
                "Appointment is already {}!",
                request.status
            )));
        }

        if appointment.appointment.status.is_terminal() {
            return Err(AppointmentError::Conflict(
                "Cannot modify a completed appointment!".to_string(),
            ));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
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
                Some(json!({
                    "status": request.status,
                    "cancellation_reason": cancellation_reason,
                })),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound(
                "Appointment not found!".to_string(),
            ));
        }

        self.send_transition_notifications(
            &appointment,
            request.status,
            cancellation_reason.as_deref(),
            &caps,
            auth_token,
        )
        .await;

        self.booking.get_appointment(appointment_id, auth_token).await
    }

    /// Notify the booking user when the organization acted on their
    /// appointment. Self-service changes stay silent, and failures are
    /// logged and dropped.
    async fn send_transition_notifications(
        &self,
        appointment: &AppointmentWithOrganization,
        new_status: AppointmentStatus,
        cancellation_reason: Option<&str>,
        caps: &ActorCapabilities,
        auth_token: &str,
    ) {
        let is_organization_update = caps.is_org_privileged && !caps.is_appointment_owner;
        if !is_organization_update {
            return;
        }

        let formatted_start = appointment
            .appointment
            .start_time
            .format("%Y-%m-%d %H:%M UTC");

        let (notification_type, title, message) = match new_status {
            AppointmentStatus::Confirmed => (
                NotificationType::AppointmentConfirmed,
                "Appointment Confirmed",
                format!(
                    "Your appointment \"{}\" scheduled for {} in {} has been confirmed.",
                    appointment.appointment.title, formatted_start, appointment.organization.name
                ),
            ),
            AppointmentStatus::Cancelled => (
                NotificationType::AppointmentCancelled,
                "Appointment Cancelled by Organization",
                format!(
                    "Your appointment \"{}\" scheduled for {} in {} has been cancelled.{}",
                    appointment.appointment.title,
                    formatted_start,
                    appointment.organization.name,
                    cancellation_reason
                        .map(|r| format!(" Reason: {}", r))
                        .unwrap_or_default()
                ),
            ),
            _ => return,
        };

        if let Err(e) = self
            .notifications
            .notify_user(
                appointment.appointment.user_id,
                appointment.appointment.organization_id,
                Some(appointment.appointment.id),
                notification_type,
                title,
                &message,
                auth_token,
            )
            .await
        {
            warn!(
                "Failed to send status notification for appointment {}: {}",
                appointment.appointment.id, e
            );
        }
    }
}
