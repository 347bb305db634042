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

use chat_cell::router::chat_routes;
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

fn conversation_row(id: &Uuid, patient_id: &str, doctor_id: &Uuid) -> Value {
    json!({
        "id": id,
        "patient_id": patient_id,
        "doctor_id": doctor_id
    })
}

#[tokio::test]
async fn messages_without_conversation_id_are_empty() {
    let config = TestConfig::default().to_app_config();
    let app: Router = chat_routes(Arc::new(config.clone()));

    let token = bearer_token(&config, &TestUser::patient("p@example.com"));
    let request = Request::builder()
        .method("GET")
        .uri("/messages")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn send_rejects_blank_text() {
    let config = TestConfig::default().to_app_config();
    let app: Router = chat_routes(Arc::new(config.clone()));

    let token = bearer_token(&config, &TestUser::patient("p@example.com"));
    let request = Request::builder()
        .method("POST")
        .uri("/messages")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "conversationId": Uuid::new_v4(), "text": "   " }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_to_unknown_conversation_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let app: Router = chat_routes(Arc::new(config.clone()));

    Mock::given(method("GET"))
        .and(path("/rest/v1/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let token = bearer_token(&config, &TestUser::patient("p@example.com"));
    let request = Request::builder()
        .method("POST")
        .uri("/messages")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "conversationId": Uuid::new_v4(), "text": "hello" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_by_non_participant_is_forbidden() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let app: Router = chat_routes(Arc::new(config.clone()));

    let conversation_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            conversation_row(&conversation_id, &Uuid::new_v4().to_string(), &Uuid::new_v4())
        ])))
        .mount(&mock_server)
        .await;

    let token = bearer_token(&config, &TestUser::patient("stranger@example.com"));
    let request = Request::builder()
        .method("POST")
        .uri("/messages")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "conversationId": conversation_id, "text": "hello" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn participant_sends_trimmed_message() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let app: Router = chat_routes(Arc::new(config.clone()));

    let patient = TestUser::patient("p@example.com");
    let conversation_id = Uuid::new_v4();
    let message_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            conversation_row(&conversation_id, &patient.id, &Uuid::new_v4())
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/messages"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": message_id,
            "conversation_id": conversation_id,
            "sender_id": patient.id,
            "text": "hello",
            "created_at": "2024-01-01T12:00:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = bearer_token(&config, &patient);
    let request = Request::builder()
        .method("POST")
        .uri("/messages")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "conversationId": conversation_id, "text": "  hello  " }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"]["text"], "hello");
    assert_eq!(body["message"]["conversationId"], conversation_id.to_string());
}

#[tokio::test]
async fn patient_thread_reuses_existing_assignment_and_conversation() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let app: Router = chat_routes(Arc::new(config.clone()));

    let patient = TestUser::patient("p@example.com");
    let doctor_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/assignments"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "doctor_id": doctor_id }])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            conversation_row(&conversation_id, &patient.id, &doctor_id)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::user_summary_row(&doctor_id.to_string(), "Dr. Lee", "lee@example.com")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "text": "see you tomorrow",
            "created_at": "2024-01-01T12:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let token = bearer_token(&config, &patient);
    let request = Request::builder()
        .method("GET")
        .uri("/threads")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["conversationId"], conversation_id.to_string());
    assert_eq!(items[0]["peer"]["email"], "lee@example.com");
    assert_eq!(items[0]["last"]["text"], "see you tomorrow");
}
