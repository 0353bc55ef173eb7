use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Weekly availability rules
        .route(
            "/organizations/{organization_id}/weekly-availability",
            get(handlers::list_weekly_availability),
        )
        .route(
            "/organizations/{organization_id}/weekly-availability",
            put(handlers::replace_weekly_availability),
        )
        .route(
            "/weekly-availability/{availability_id}",
            delete(handlers::delete_weekly_availability),
        )
        // Date blackouts
        .route(
            "/organizations/{organization_id}/unavailable-dates",
            get(handlers::list_unavailable_dates),
        )
        .route(
            "/organizations/{organization_id}/unavailable-dates",
            post(handlers::create_unavailable_date),
        )
        .route(
            "/unavailable-dates/{unavailable_date_id}",
            delete(handlers::delete_unavailable_date),
        )
        // Resolved hour-by-hour view
        .route(
            "/organizations/{organization_id}/day-schedule",
            get(handlers::get_day_schedule),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
