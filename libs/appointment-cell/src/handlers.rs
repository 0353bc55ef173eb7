// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    CreateAppointmentRequest, CreateAppointmentTypeRequest, UpdateAppointmentTypeRequest,
    UpdateStatusRequest,
};
use crate::services::lifecycle::actor_capabilities;
use crate::services::{AppointmentTypeService, BookingService, StatusTransitionService};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = BookingService::new(&state);

    let appointment = service.create_appointment(request, &user, token).await?;

    Ok(Json(json!({
        "message": "Appointment created successfully!",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = BookingService::new(&state);

    let appointment = service.get_appointment(appointment_id, token).await?;
    let capabilities = actor_capabilities(&user, &appointment);

    Ok(Json(json!({
        "appointment": appointment,
        "capabilities": capabilities
    })))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = BookingService::new(&state);

    let appointments = service.user_appointments(&user, token).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_organization_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = BookingService::new(&state);

    let appointments = service
        .organization_appointments(organization_id, &user, token)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointments_by_date(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = BookingService::new(&state);

    let appointments = service
        .appointments_by_date(organization_id, &query.date, token)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "date": query.date,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = StatusTransitionService::new(&state);

    let status = request.status;
    let appointment = service
        .update_status(appointment_id, request, &user, token)
        .await?;

    Ok(Json(json!({
        "message": format!("Appointment {} successfully!", status),
        "appointment": appointment
    })))
}

// ==============================================================================
// APPOINTMENT TYPE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointment_types(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = AppointmentTypeService::new(&state);

    let types = service.list_types(organization_id, &user, token).await?;

    Ok(Json(json!({
        "appointment_types": types,
        "total": types.len()
    })))
}

#[axum::debug_handler]
pub async fn create_appointment_type(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentTypeRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = AppointmentTypeService::new(&state);

    let appointment_type = service
        .create_type(organization_id, request, &user, token)
        .await?;

    Ok(Json(json!({
        "message": "Appointment type created successfully!",
        "appointment_type": appointment_type
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_type(
    State(state): State<Arc<AppConfig>>,
    Path(type_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentTypeRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = AppointmentTypeService::new(&state);

    let appointment_type = service.update_type(type_id, request, &user, token).await?;

    Ok(Json(json!({
        "message": "Appointment type updated successfully!",
        "appointment_type": appointment_type
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment_type(
    State(state): State<Arc<AppConfig>>,
    Path(type_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = AppointmentTypeService::new(&state);

    service.delete_type(type_id, &user, token).await?;

    Ok(Json(json!({
        "message": "Appointment type deleted successfully!"
    })))
}
