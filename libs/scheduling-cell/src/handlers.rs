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

use crate::models::{CreateUnavailableDateRequest, ReplaceWeeklyAvailabilityRequest};
use crate::services::ScheduleService;

#[derive(Debug, Deserialize)]
pub struct DayScheduleQuery {
    pub date: String,
}

// ==============================================================================
// WEEKLY AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_weekly_availability(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = ScheduleService::new(&state);

    let availability = service
        .list_weekly_availability(organization_id, token)
        .await?;

    Ok(Json(json!({
        "organization_id": organization_id,
        "availability": availability
    })))
}

#[axum::debug_handler]
pub async fn replace_weekly_availability(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ReplaceWeeklyAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = ScheduleService::new(&state);

    service
        .replace_weekly_availability(organization_id, request, &user, token)
        .await?;

    let availability = service
        .list_weekly_availability(organization_id, token)
        .await?;

    Ok(Json(json!({
        "organization_id": organization_id,
        "availability": availability
    })))
}

#[axum::debug_handler]
pub async fn delete_weekly_availability(
    State(state): State<Arc<AppConfig>>,
    Path(availability_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = ScheduleService::new(&state);

    service
        .delete_weekly_availability(availability_id, &user, token)
        .await?;

    Ok(Json(json!({
        "message": "Weekly availability deleted"
    })))
}

// ==============================================================================
// UNAVAILABLE DATE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_unavailable_dates(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = ScheduleService::new(&state);

    let dates = service
        .list_unavailable_dates(organization_id, token)
        .await?;

    Ok(Json(json!({
        "organization_id": organization_id,
        "unavailable_dates": dates
    })))
}

#[axum::debug_handler]
pub async fn create_unavailable_date(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateUnavailableDateRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = ScheduleService::new(&state);

    let created = service
        .create_unavailable_date(organization_id, request, &user, token)
        .await?;

    Ok(Json(json!(created)))
}

#[axum::debug_handler]
pub async fn delete_unavailable_date(
    State(state): State<Arc<AppConfig>>,
    Path(unavailable_date_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = ScheduleService::new(&state);

    service
        .delete_unavailable_date(unavailable_date_id, &user, token)
        .await?;

    Ok(Json(json!({
        "message": "Unavailable date deleted"
    })))
}

// ==============================================================================
// DAY SCHEDULE HANDLER
// ==============================================================================

#[axum::debug_handler]
pub async fn get_day_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(organization_id): Path<Uuid>,
    Query(query): Query<DayScheduleQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = ScheduleService::new(&state);

    let schedule = service
        .day_schedule(organization_id, &query.date, token)
        .await?;

    Ok(Json(json!(schedule)))
}
