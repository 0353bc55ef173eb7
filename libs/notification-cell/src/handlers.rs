use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::MarkReadRequest;
use crate::services::NotificationService;

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let notifications = service.list_for_user(&user, token).await?;
    let unread = notifications.iter().filter(|n| !n.read).count();

    Ok(Json(json!({
        "notifications": notifications,
        "unread_count": unread
    })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<AppConfig>>,
    Path(notification_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let notification = service
        .mark_read(notification_id, request.read, &user, token)
        .await?;

    Ok(Json(json!(notification)))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    let count = service.mark_all_read(&user, token).await?;

    Ok(Json(json!({
        "message": format!("Marked {} notification(s) as read", count),
        "count": count
    })))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<Arc<AppConfig>>,
    Path(notification_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = NotificationService::new(&state);

    service.delete(notification_id, &user, token).await?;

    Ok(Json(json!({
        "message": "Notification deleted"
    })))
}
