// libs/appointment-cell/src/services/types.rs
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    AppointmentError, AppointmentType, CreateAppointmentTypeRequest, OrganizationSummary,
    UpdateAppointmentTypeRequest,
};

const MAX_DURATION_MINUTES: i32 = 1440;

pub struct AppointmentTypeService {
    supabase: SupabaseClient,
}

impl AppointmentTypeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// List an organization's appointment types. Inactive types stay hidden
    /// unless the caller is the organization owner or a platform admin.
    pub async fn list_types(
        &self,
        organization_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<Vec<AppointmentType>, AppointmentError> {
        let privileged = self
            .is_org_privileged(organization_id, user, auth_token)
            .await
            .unwrap_or(false);

        let mut path = format!(
            "/rest/v1/appointment_types?organization_id=eq.{}&order=created_at.desc",
            organization_id
        );
        if !privileged {
            path.push_str("&is_active=eq.true");
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AppointmentType>, _>>()
            .map_err(|e| {
                AppointmentError::Database(format!("Failed to parse appointment types: {}", e))
            })
    }

    pub async fn create_type(
        &self,
        organization_id: Uuid,
        request: CreateAppointmentTypeRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<AppointmentType, AppointmentError> {
        debug!(
            "Creating appointment type \"{}\" for organization {}",
            request.name, organization_id
        );

        if request.name.trim().is_empty() {
            return Err(AppointmentError::Validation("Invalid fields!".to_string()));
        }
        validate_duration(request.duration_minutes)?;
        validate_color(request.color.as_deref())?;

        if !self
            .is_org_privileged(organization_id, user, auth_token)
            .await?
        {
            return Err(AppointmentError::Permission(
                "Organization not found or you don't have permission to add appointment types!"
                    .to_string(),
            ));
        }

        let body = json!({
            "organization_id": organization_id,
            "name": request.name,
            "description": request.description,
            "duration_minutes": request.duration_minutes,
            "color": request.color,
            "is_active": true,
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
                "/rest/v1/appointment_types",
                Some(auth_token),
                Some(body),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.first().ok_or_else(|| {
            AppointmentError::Database("Failed to create appointment type".to_string())
        })?;

        serde_json::from_value(row.clone()).map_err(|e| {
            AppointmentError::Database(format!("Failed to parse appointment type: {}", e))
        })
    }

    pub async fn update_type(
        &self,
        type_id: Uuid,
        request: UpdateAppointmentTypeRequest,
        user: &User,
        auth_token: &str,
    ) -> Result<AppointmentType, AppointmentError> {
        let existing = self.get_type(type_id, auth_token).await?;

        if !self
            .is_org_privileged(existing.organization_id, user, auth_token)
            .await?
        {
            return Err(AppointmentError::Permission(
                "You don't have permission to update this appointment type!".to_string(),
            ));
        }

        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(AppointmentError::Validation("Invalid fields!".to_string()));
            }
        }
        if let Some(duration) = request.duration_minutes {
            validate_duration(duration)?;
        }
        validate_color(request.color.as_deref())?;

        let mut patch = serde_json::Map::new();
        if let Some(name) = request.name {
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            patch.insert("description".to_string(), json!(description));
        }
        if let Some(duration) = request.duration_minutes {
            patch.insert("duration_minutes".to_string(), json!(duration));
        }
        if let Some(color) = request.color {
            patch.insert("color".to_string(), json!(color));
        }
        if let Some(is_active) = request.is_active {
            patch.insert("is_active".to_string(), json!(is_active));
        }

        let path = format!("/rest/v1/appointment_types?id=eq.{}", type_id);
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
                Some(Value::Object(patch)),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.first().ok_or_else(|| {
            AppointmentError::NotFound("Appointment type not found!".to_string())
        })?;

        serde_json::from_value(row.clone()).map_err(|e| {
            AppointmentError::Database(format!("Failed to parse appointment type: {}", e))
        })
    }

    pub async fn delete_type(
        &self,
        type_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let existing = self.get_type(type_id, auth_token).await?;

        if !self
            .is_org_privileged(existing.organization_id, user, auth_token)
            .await?
        {
            return Err(AppointmentError::Permission(
                "You don't have permission to delete this appointment type!".to_string(),
            ));
        }

        let path = format!("/rest/v1/appointment_types?id=eq.{}", type_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(headers))
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_type(
        &self,
        type_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentType, AppointmentError> {
        let path = format!("/rest/v1/appointment_types?id=eq.{}", type_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.first().ok_or_else(|| {
            AppointmentError::NotFound("Appointment type not found!".to_string())
        })?;

        serde_json::from_value(row.clone()).map_err(|e| {
            AppointmentError::Database(format!("Failed to parse appointment type: {}", e))
        })
    }

    async fn is_org_privileged(
        &self,
        organization_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        if user.is_admin() {
            return Ok(true);
        }

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

        let organization: OrganizationSummary = serde_json::from_value(row.clone())
            .map_err(|e| AppointmentError::Database(format!("Failed to parse organization: {}", e)))?;

        Ok(organization.created_by.to_string() == user.id)
    }
}

fn validate_duration(duration_minutes: i32) -> Result<(), AppointmentError> {
    if duration_minutes < 1 || duration_minutes > MAX_DURATION_MINUTES {
        return Err(AppointmentError::Validation(
            "Duration must be between 1 and 1440 minutes!".to_string(),
        ));
    }
    Ok(())
}

// Accepts "#RRGGBB" or an empty string. Absent means no color.
fn validate_color(color: Option<&str>) -> Result<(), AppointmentError> {
    let Some(color) = color else {
        return Ok(());
    };
    if color.is_empty() {
        return Ok(());
    }

    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppointmentError::Validation(
            "Color must be a valid hex color (e.g., #FF5733)".to_string(),
        ));
    }
    Ok(())
}
