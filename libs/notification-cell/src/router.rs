use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn notification_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/read-all", patch(handlers::mark_all_notifications_read))
        .route("/{notification_id}/read", patch(handlers::mark_notification_read))
        .route("/{notification_id}", delete(handlers::delete_notification))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
