use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prediction_cell::router::{doctor_insight_routes, prediction_routes};
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

fn bearer_token(config: &AppConfig, user: &TestUser) -> String {
    JwtTestUtils::create_test_token(user, &config.supabase_jwt_secret, Some(24))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn recording_rejects_unknown_emotion() {
    let config = TestConfig::default().to_app_config();
    let app: Router = prediction_routes(Arc::new(config.clone()));

    let token = bearer_token(&config, &TestUser::patient("p@example.com"));
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "emotion": "joyful" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid emotion");
}

#[tokio::test]
async fn recording_accepts_lowercase_emotion() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let app: Router = prediction_routes(Arc::new(config.clone()));

    let prediction_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/predictions"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([{ "id": prediction_id }])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = bearer_token(&config, &TestUser::patient("p@example.com"));
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "emotion": "negative" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], prediction_id.to_string());
}

#[tokio::test]
async fn alerts_require_doctor_role() {
    let config = TestConfig::default().to_app_config();
    let app: Router = doctor_insight_routes(Arc::new(config.clone()));

    let token = bearer_token(&config, &TestUser::patient("p@example.com"));
    let request = Request::builder()
        .method("GET")
        .uri("/alerts")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn alerts_flag_patients_with_negative_streaks() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let app: Router = doctor_insight_routes(Arc::new(config.clone()));

    let doctor = TestUser::doctor("d@example.com");
    let flagged = Uuid::new_v4();
    let steady = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/assignments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "patient_id": flagged },
            { "patient_id": steady }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/predictions"))
        .and(query_param("patient_id", format!("eq.{}", flagged)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::prediction_row("NEGATIVE", "2024-01-03T12:00:00Z"),
            MockStoreResponses::prediction_row("NEGATIVE", "2024-01-02T12:00:00Z"),
            MockStoreResponses::prediction_row("NEGATIVE", "2024-01-01T12:00:00Z"),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/predictions"))
        .and(query_param("patient_id", format!("eq.{}", steady)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::prediction_row("POSITIVE", "2024-01-03T12:00:00Z"),
            MockStoreResponses::prediction_row("NEGATIVE", "2024-01-02T12:00:00Z"),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", flagged)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::user_summary_row(&flagged.to_string(), "Ana", "ana@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let token = bearer_token(&config, &doctor);
    let request = Request::builder()
        .method("GET")
        .uri("/alerts")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["patient"]["id"], flagged.to_string());
    assert_eq!(items[0]["streak"], 3);
    assert_eq!(items[0]["lastAt"], "2024-01-03T12:00:00Z");
}

#[tokio::test]
async fn analytics_aggregate_per_patient_counts() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let app: Router = doctor_insight_routes(Arc::new(config.clone()));

    let doctor = TestUser::doctor("d@example.com");
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/assignments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "patient_id": patient_id }])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/predictions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::prediction_row("NEGATIVE", "2024-01-03T12:00:00Z"),
            MockStoreResponses::prediction_row("POSITIVE", "2024-01-02T12:00:00Z"),
            MockStoreResponses::prediction_row("POSITIVE", "2024-01-01T12:00:00Z"),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::user_summary_row(&patient_id.to_string(), "Ana", "ana@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let token = bearer_token(&config, &doctor);
    let request = Request::builder()
        .method("GET")
        .uri("/analytics")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["summary"]["total"], 3);
    assert_eq!(body["summary"]["NEGATIVE"], 1);
    assert_eq!(body["summary"]["POSITIVE"], 2);
    assert_eq!(body["perPatient"][0]["NEGATIVE"], 1);
    assert_eq!(body["perPatient"][0]["patient"]["email"], "ana@example.com");
}
