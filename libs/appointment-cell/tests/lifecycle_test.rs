use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn create_test_app(config: AppConfig) -> Router {
    appointment_routes(Arc::new(config))
}

fn appointment_with_org(
    appointment_id: &Uuid,
    user_id: &str,
    org_owner: &str,
    status: &str,
) -> serde_json::Value {
    json!({
        "id": appointment_id,
        "organization_id": Uuid::new_v4(),
        "appointment_type_id": null,
        "user_id": user_id,
        "title": "Intro call",
        "description": null,
        "start_time": "2024-01-08T10:00:00Z",
        "end_time": "2024-01-08T11:00:00Z",
        "status": status,
        "contact_name": null,
        "contact_email": null,
        "contact_phone": null,
        "notes": null,
        "cancellation_reason": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "organization": {
            "id": Uuid::new_v4(),
            "name": "Acme Studio",
            "created_by": org_owner
        }
    })
}

async fn mock_appointment_fetch(mock_server: &MockServer, row: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(mock_server)
        .await;
}

fn status_request(
    appointment_id: &Uuid,
    token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(&format!("/{}/status", appointment_id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_owner_cancels_own_appointment_silently() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let appointment_id = Uuid::new_v4();

    mock_appointment_fetch(
        &mock_server,
        appointment_with_org(&appointment_id, &user.id, &Uuid::new_v4().to_string(), "PENDING"),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_with_org(&appointment_id, &user.id, &Uuid::new_v4().to_string(), "CANCELLED")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Self-cancellation notifies nobody.
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(status_request(
            &appointment_id,
            &token,
            json!({ "status": "CANCELLED", "cancellation_reason": "Can't make it" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cancel_requires_reason() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let appointment_id = Uuid::new_v4();

    mock_appointment_fetch(
        &mock_server,
        appointment_with_org(&appointment_id, &user.id, &Uuid::new_v4().to_string(), "PENDING"),
    )
    .await;

    let response = app
        .oneshot(status_request(
            &appointment_id,
            &token,
            json!({ "status": "CANCELLED" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["error"], "Cancellation reason is required!");
}

#[tokio::test]
async fn test_non_privileged_actor_cannot_confirm() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    // The booking user themselves, but confirmation is org-only.
    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let appointment_id = Uuid::new_v4();

    mock_appointment_fetch(
        &mock_server,
        appointment_with_org(&appointment_id, &user.id, &Uuid::new_v4().to_string(), "PENDING"),
    )
    .await;

    let response = app
        .oneshot(status_request(
            &appointment_id,
            &token,
            json!({ "status": "CONFIRMED" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json_response["error"],
        "You don't have permission to update this appointment!"
    );
}

#[tokio::test]
async fn test_org_owner_confirmation_notifies_booking_user() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let org_owner = TestUser::user("owner@example.com");
    let token = JwtTestUtils::create_test_token(&org_owner, &config.supabase_jwt_secret, Some(24));
    let appointment_id = Uuid::new_v4();
    let booking_user = Uuid::new_v4().to_string();

    mock_appointment_fetch(
        &mock_server,
        appointment_with_org(&appointment_id, &booking_user, &org_owner.id, "PENDING"),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_with_org(&appointment_id, &booking_user, &org_owner.id, "CONFIRMED")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(status_request(
            &appointment_id,
            &token,
            json!({ "status": "CONFIRMED" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_redundant_transition_conflicts() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let org_owner = TestUser::user("owner@example.com");
    let token = JwtTestUtils::create_test_token(&org_owner, &config.supabase_jwt_secret, Some(24));
    let appointment_id = Uuid::new_v4();

    mock_appointment_fetch(
        &mock_server,
        appointment_with_org(
            &appointment_id,
            &Uuid::new_v4().to_string(),
            &org_owner.id,
            "CONFIRMED",
        ),
    )
    .await;

    let response = app
        .oneshot(status_request(
            &appointment_id,
            &token,
            json!({ "status": "CONFIRMED" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["error"], "Appointment is already confirmed!");
}

#[tokio::test]
async fn test_completed_appointment_is_terminal() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let org_owner = TestUser::user("owner@example.com");
    let token = JwtTestUtils::create_test_token(&org_owner, &config.supabase_jwt_secret, Some(24));
    let appointment_id = Uuid::new_v4();

    mock_appointment_fetch(
        &mock_server,
        appointment_with_org(
            &appointment_id,
            &Uuid::new_v4().to_string(),
            &org_owner.id,
            "COMPLETED",
        ),
    )
    .await;

    let response = app
        .oneshot(status_request(
            &appointment_id,
            &token,
            json!({ "status": "CONFIRMED" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["error"], "Cannot modify a completed appointment!");
}

#[tokio::test]
async fn test_missing_appointment_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(status_request(
            &Uuid::new_v4(),
            &token,
            json!({ "status": "CONFIRMED" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
