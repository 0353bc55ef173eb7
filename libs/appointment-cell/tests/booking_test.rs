use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn create_test_app(config: AppConfig) -> Router {
    appointment_routes(Arc::new(config))
}

fn organization_row(org_id: &Uuid) -> serde_json::Value {
    json!({
        "id": org_id,
        "name": "Acme Studio",
        "created_by": Uuid::new_v4()
    })
}

fn appointment_row(
    org_id: &Uuid,
    user_id: &str,
    start: &str,
    end: &str,
) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "organization_id": org_id,
        "appointment_type_id": null,
        "user_id": user_id,
        "title": "Intro call",
        "description": null,
        "start_time": start,
        "end_time": end,
        "status": "PENDING",
        "contact_name": null,
        "contact_email": null,
        "contact_phone": null,
        "notes": null,
        "cancellation_reason": null,
        "created_at": start,
        "updated_at": start
    })
}

async fn mock_fanout(mock_server: &MockServer, org_id: &Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([organization_row(org_id)])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/organization_members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "user_id": Uuid::new_v4() }
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_create_appointment_defaults_to_sixty_minutes() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let org_id = Uuid::new_v4();

    mock_fanout(&mock_server, &org_id).await;

    // The matcher pins the persisted row, so a wrong end_time computation
    // leaves the mock unmatched and the insert fails.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({
            "start_time": "2024-01-08T10:00:00Z",
            "end_time": "2024-01-08T11:00:00Z",
            "status": "PENDING"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(
            &org_id,
            &user.id,
            "2024-01-08T10:00:00Z",
            "2024-01-08T11:00:00Z",
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request_body = json!({
        "organization_id": org_id,
        "date": "2024-01-08",
        "hour": "10:00",
        "title": "Intro call"
    });

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["message"], "Appointment created successfully!");
    assert_eq!(json_response["appointment"]["status"], "PENDING");
    assert_eq!(
        json_response["appointment"]["end_time"],
        "2024-01-08T11:00:00Z"
    );
}

#[tokio::test]
async fn test_create_appointment_uses_type_duration() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let org_id = Uuid::new_v4();
    let type_id = Uuid::new_v4();

    mock_fanout(&mock_server, &org_id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": type_id,
            "organization_id": org_id,
            "name": "Short consult",
            "description": null,
            "duration_minutes": 30,
            "is_active": true
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({
            "start_time": "2024-01-08T10:00:00Z",
            "end_time": "2024-01-08T10:30:00Z",
            "status": "PENDING"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(
            &org_id,
            &user.id,
            "2024-01-08T10:00:00Z",
            "2024-01-08T10:30:00Z",
        )])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request_body = json!({
        "organization_id": org_id,
        "appointment_type_id": type_id,
        "date": "2024-01-08",
        "hour": "10:00",
        "title": "Intro call"
    });

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json_response["appointment"]["end_time"],
        "2024-01-08T10:30:00Z"
    );
}

#[tokio::test]
async fn test_create_appointment_rejects_inactive_type() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let org_id = Uuid::new_v4();

    // Lookup filters on is_active, so an inactive type comes back empty.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request_body = json!({
        "organization_id": org_id,
        "appointment_type_id": Uuid::new_v4(),
        "date": "2024-01-08",
        "hour": "10:00",
        "title": "Intro call"
    });

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json_response["error"],
        "Appointment type not found or inactive!"
    );
}

#[tokio::test]
async fn test_create_appointment_rejects_malformed_date() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let request_body = json!({
        "organization_id": Uuid::new_v4(),
        "date": "01/08/2024",
        "hour": "10:00",
        "title": "Intro call"
    });

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_appointment_missing_organization() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request_body = json!({
        "organization_id": Uuid::new_v4(),
        "date": "2024-01-08",
        "hour": "10:00",
        "title": "Intro call"
    });

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_succeeds_when_notifications_fail() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let org_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([organization_row(&org_id)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/organization_members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(
            &org_id,
            &user.id,
            "2024-01-08T10:00:00Z",
            "2024-01-08T11:00:00Z",
        )])))
        .mount(&mock_server)
        .await;

    // Notification insert blows up; the booking must still succeed.
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "internal error"
        })))
        .mount(&mock_server)
        .await;

    let request_body = json!({
        "organization_id": org_id,
        "date": "2024-01-08",
        "hour": "10:00",
        "title": "Intro call"
    });

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_overlapping_bookings_both_succeed() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();

    let user = TestUser::user("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    let org_id = Uuid::new_v4();

    mock_fanout(&mock_server, &org_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(
            &org_id,
            &user.id,
            "2024-01-08T10:00:00Z",
            "2024-01-08T11:00:00Z",
        )])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let request_body = json!({
        "organization_id": org_id,
        "date": "2024-01-08",
        "hour": "10:00",
        "title": "Intro call"
    });

    // Same slot booked twice; no conflict check stands in the way.
    for _ in 0..2 {
        let app = create_test_app(config.clone()).await;
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(request_body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
