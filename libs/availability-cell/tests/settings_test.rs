use std::sync::Arc;
use axum::extract::{Extension, State};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};
use uuid::Uuid;

use availability_cell::handlers;
use availability_cell::models::{AvailabilityError, UpdateAvailabilityRequest};
use availability_cell::services::AvailabilityService;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::test_utils::{TestConfig, TestUser, MockStoreResponses};

fn user_extension(test_user: &TestUser) -> Extension<User> {
    Extension(test_user.to_user())
}

fn auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer("test-token").unwrap())
}

fn service_for(mock_server: &MockServer) -> AvailabilityService {
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    AvailabilityService::new(&config)
}

#[tokio::test]
async fn ensure_settings_creates_defaults_when_missing() {
    let mock_server = MockServer::start().await;
    let settings_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_settings"))
        .and(query_param("key", "eq.default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_settings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::availability_settings_response(&settings_id)
        ])))
        .mount(&mock_server)
        .await;

    let settings = service_for(&mock_server).ensure_settings(None).await.unwrap();

    assert_eq!(settings.key, "default");
    assert_eq!(settings.start_time, "09:00");
    assert_eq!(settings.end_time, "17:00");
    assert_eq!(settings.slot_duration_minutes, 60);
    assert_eq!(settings.working_days, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(settings.break_start_time.as_deref(), Some("13:00"));
    assert_eq!(settings.break_end_time.as_deref(), Some("14:00"));
}

#[tokio::test]
async fn ensure_settings_is_idempotent() {
    let mock_server = MockServer::start().await;
    let settings_id = Uuid::new_v4().to_string();

    // Only a GET is mounted: a second create attempt would fail the test.
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_settings"))
        .and(query_param("key", "eq.default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::availability_settings_response(&settings_id)
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let first = service.ensure_settings(None).await.unwrap();
    let second = service.ensure_settings(None).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.start_time, second.start_time);
    assert_eq!(first.slot_duration_minutes, second.slot_duration_minutes);
}

#[tokio::test]
async fn update_rejects_invalid_patch_before_any_store_call() {
    let mock_server = MockServer::start().await;

    let patch = UpdateAvailabilityRequest {
        slot_duration_minutes: Some(10),
        ..Default::default()
    };

    let error = service_for(&mock_server)
        .update_settings(patch, None)
        .await
        .unwrap_err();

    match error {
        AvailabilityError::Validation(msg) => assert!(msg.contains(">= 15")),
        other => panic!("expected validation error, got {:?}", other),
    }

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "store was called before validation finished");
}

#[tokio::test]
async fn update_writes_only_provided_fields() {
    let mock_server = MockServer::start().await;
    let settings_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::availability_settings_response(&settings_id)
        ])))
        .mount(&mock_server)
        .await;

    let updated_row = json!({
        "id": settings_id,
        "key": "default",
        "start_time": "09:00",
        "end_time": "12:00",
        "slot_duration_minutes": 60,
        "working_days": [1, 2, 3, 4, 5],
        "break_start_time": "13:00",
        "break_end_time": "14:00",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z"
    });

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/availability_settings"))
        .and(query_param("key", "eq.default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated_row])))
        .mount(&mock_server)
        .await;

    let patch = UpdateAvailabilityRequest {
        end_time: Some("12:00".to_string()),
        working_days: Some(vec![1, 2, 3, 4, 5]),
        ..Default::default()
    };

    let (settings, slots) = service_for(&mock_server)
        .update_settings(patch, None)
        .await
        .unwrap();

    assert_eq!(settings.end_time, "12:00");
    // Slots are recomputed from the updated row; break starts after the
    // shortened window so it no longer removes anything.
    assert_eq!(slots, vec!["9:00 AM", "10:00 AM", "11:00 AM"]);

    let patch_request = mock_server.received_requests().await.unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PATCH")
        .expect("no PATCH issued");
    let body: serde_json::Value = serde_json::from_slice(&patch_request.body).unwrap();
    assert_eq!(body["end_time"], "12:00");
    assert!(body.get("start_time").is_none(), "unset field was written");
    assert!(body.get("slot_duration_minutes").is_none(), "unset field was written");
}

#[tokio::test]
async fn public_availability_includes_generated_slots() {
    let mock_server = MockServer::start().await;
    let settings_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::availability_settings_response(&settings_id)
        ])))
        .mount(&mock_server)
        .await;

    let config = Arc::new(TestConfig::with_store_url(&mock_server.uri()).to_app_config());
    let axum::Json(body) = handlers::get_public_availability(State(config)).await.unwrap();

    let availability = &body["availability"];
    assert_eq!(availability["start_time"], "09:00");
    assert_eq!(
        availability["slots"],
        json!(["9:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "2:00 PM", "3:00 PM", "4:00 PM"])
    );
    // The public view never exposes the row id.
    assert!(availability.get("id").is_none());
}

#[tokio::test]
async fn admin_endpoints_reject_customers() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_store_url(&mock_server.uri()).to_app_config());
    let customer = TestUser::customer("customer@example.com");

    let result = handlers::get_admin_availability(
        State(config.clone()),
        auth_header(),
        user_extension(&customer),
    ).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let result = handlers::update_availability(
        State(config),
        auth_header(),
        user_extension(&customer),
        axum::Json(UpdateAvailabilityRequest::default()),
    ).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn admin_availability_includes_row_id() {
    let mock_server = MockServer::start().await;
    let settings_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::availability_settings_response(&settings_id)
        ])))
        .mount(&mock_server)
        .await;

    let config = Arc::new(TestConfig::with_store_url(&mock_server.uri()).to_app_config());
    let admin = TestUser::admin("admin@example.com");

    let axum::Json(body) = handlers::get_admin_availability(
        State(config),
        auth_header(),
        user_extension(&admin),
    ).await.unwrap();

    assert_eq!(body["availability"]["id"], json!(settings_id));
}
