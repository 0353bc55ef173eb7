// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/me", get(handlers::get_my_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        // Organization views
        .route(
            "/organizations/{organization_id}",
            get(handlers::get_organization_appointments),
        )
        .route(
            "/organizations/{organization_id}/by-date",
            get(handlers::get_appointments_by_date),
        )
        // Appointment types
        .route(
            "/organizations/{organization_id}/types",
            get(handlers::list_appointment_types),
        )
        .route(
            "/organizations/{organization_id}/types",
            post(handlers::create_appointment_type),
        )
        .route("/types/{type_id}", put(handlers::update_appointment_type))
        .route("/types/{type_id}", delete(handlers::delete_appointment_type))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
