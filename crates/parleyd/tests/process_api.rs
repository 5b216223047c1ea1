//! End-to-end tests for the HTTP surface.
//!
//! The router is driven in-process with fake AI and store backends, so no
//! network or database is needed.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use parley_common::{
    FakeFallbackClient, FallbackError, Intent, MemoryInteractionStore, SqliteInteractionStore,
    PROCESSED_MESSAGE,
};
use parleyd::server::{app, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Helpers
// ============================================================================

fn test_app(fallback: &Arc<FakeFallbackClient>, store: &Arc<MemoryInteractionStore>) -> Router {
    app(AppState::new(fallback.clone(), store.clone()))
}

fn process_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_weather_query_is_stored_without_ai_response() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
    let store = Arc::new(MemoryInteractionStore::new());

    let (status, body) = send(
        test_app(&fallback, &store),
        process_request(r#"{"text": "What's the weather today?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "weather_query");
    assert_eq!(body["message"], PROCESSED_MESSAGE);
    assert!(body["ai_response"].is_null());

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].intent, Intent::WeatherQuery);
    assert_eq!(records[0].text, "What's the weather today?");
    assert!(records[0].ai_response.is_none());
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn test_greeting_does_not_call_fallback() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
    let store = Arc::new(MemoryInteractionStore::new());

    let (status, body) = send(
        test_app(&fallback, &store),
        process_request(r#"{"text": "Hi there"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "greeting");
    assert_eq!(store.append_calls(), 1);
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_intent_returns_ai_response() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("Why did..."));
    let store = Arc::new(MemoryInteractionStore::new());

    let (status, body) = send(
        test_app(&fallback, &store),
        process_request(r#"{"text": "Tell me a joke"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "unknown_intent");
    assert_eq!(body["ai_response"], "Why did...");

    assert_eq!(fallback.prompts(), vec!["Tell me a joke"]);
    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ai_response.as_deref(), Some("Why did..."));
}

#[tokio::test]
async fn test_fallback_error_is_500_without_store_write() {
    let fallback = Arc::new(FakeFallbackClient::always_error(FallbackError::Status {
        status: 401,
        body: "invalid api key".to_string(),
    }));
    let store = Arc::new(MemoryInteractionStore::new());

    let (status, body) = send(
        test_app(&fallback, &store),
        process_request(r#"{"text": "Tell me a joke"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("invalid api key"));
    assert_eq!(store.append_calls(), 0);
}

#[tokio::test]
async fn test_unacknowledged_write_is_500() {
    for text in ["Hi there", "what time is it", "Tell me a joke"] {
        let fallback = Arc::new(FakeFallbackClient::always_reply("Why did..."));
        let store = Arc::new(MemoryInteractionStore::unacknowledged());

        let (status, body) = send(
            test_app(&fallback, &store),
            process_request(&serde_json::json!({ "text": text }).to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "text: {}", text);
        assert_eq!(body["detail"], "Failed to store the interaction");
        assert!(body.get("ai_response").is_none());
        assert_eq!(store.append_calls(), 1);
    }
}

#[tokio::test]
async fn test_sqlite_backed_request_persists_document() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
    let store = SqliteInteractionStore::open_in_memory().unwrap();
    let app = app(AppState::new(fallback, Arc::new(store.clone())));

    let (status, body) = send(app, process_request(r#"{"text": "hello"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "greeting");
    assert_eq!(store.count_blocking().unwrap(), 1);
}

#[tokio::test]
async fn test_multi_megabyte_text_is_accepted() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
    let store = Arc::new(MemoryInteractionStore::new());

    let text = format!("weather {}", "x".repeat(3 * 1024 * 1024));
    let (status, body) = send(
        test_app(&fallback, &store),
        process_request(&serde_json::json!({ "text": text }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "weather_query");
    assert_eq!(store.append_calls(), 1);
    assert_eq!(store.records()[0].text.len(), text.len());
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_text_is_422() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
    let store = Arc::new(MemoryInteractionStore::new());

    let (status, body) = send(test_app(&fallback, &store), process_request(r#"{}"#)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("text"));
    assert_eq!(store.append_calls(), 0);
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn test_wrong_type_and_bad_json_are_422() {
    for payload in [r#"{"text": 42}"#, r#"{"text": "#, "not json"] {
        let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
        let store = Arc::new(MemoryInteractionStore::new());

        let (status, body) = send(test_app(&fallback, &store), process_request(payload)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "payload: {}", payload);
        assert!(body["detail"].is_string());
        assert_eq!(store.append_calls(), 0);
    }
}

#[tokio::test]
async fn test_missing_content_type_is_422() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
    let store = Arc::new(MemoryInteractionStore::new());

    let request = Request::builder()
        .method("POST")
        .uri("/process")
        .body(Body::from(r#"{"text": "hi"}"#))
        .unwrap();
    let (status, _) = send(test_app(&fallback, &store), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(store.append_calls(), 0);
}

#[tokio::test]
async fn test_empty_text_is_accepted_as_unknown() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("Could you repeat that?"));
    let store = Arc::new(MemoryInteractionStore::new());

    let (status, body) = send(test_app(&fallback, &store), process_request(r#"{"text": ""}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "unknown_intent");
    assert_eq!(fallback.call_count(), 1);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_stored_count() {
    let fallback = Arc::new(FakeFallbackClient::always_reply("unused"));
    let store = Arc::new(MemoryInteractionStore::new());
    let app = test_app(&fallback, &store);

    let (status, _) = send(app.clone(), process_request(r#"{"text": "hello"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["interactions_stored"], 1);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
