//! Integration tests for the Deskbot API.
//!
//! Exercises the full transport contract over an in-memory router with
//! deterministic collaborators. Each test builds independent state.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use deskbot_api::handlers::{ChatResponseBody, HealthResponse, HistoryResponse};
use deskbot_api::{create_router, AppState};
use deskbot_chat::ChatOrchestrator;
use deskbot_core::config::DeskbotConfig;
use deskbot_core::types::{Candidate, Role};
use deskbot_retrieval::{
    CannedGenerator, FailingRetriever, Generator, KeywordIntentClassifier, Retriever,
    StaticRetriever,
};

// =============================================================================
// Helpers
// =============================================================================

fn email_candidates() -> Vec<Candidate> {
    vec![
        Candidate::new("Webmail", "Open Settings, then Signature.", 0.92),
        Candidate::new("Outlook", "Open File > Options > Mail > Signatures.", 0.90),
        Candidate::new("Thunderbird", "Account Settings has a signature box.", 0.85),
    ]
}

fn make_state(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>) -> AppState {
    let config = DeskbotConfig::default();
    let orchestrator = ChatOrchestrator::new(
        &config,
        retriever,
        generator,
        Arc::new(KeywordIntentClassifier),
    );
    AppState::new(config, orchestrator)
}

/// Router whose retriever always finds the email-signature candidates.
fn make_app() -> axum::Router {
    create_router(make_state(
        Arc::new(StaticRetriever::new(email_candidates())),
        Arc::new(CannedGenerator::new("Here is how:")),
    ))
}

/// Router whose retriever never finds anything.
fn make_empty_app() -> axum::Router {
    create_router(make_state(
        Arc::new(StaticRetriever::empty()),
        Arc::new(CannedGenerator::new("Hello! How can I help?")),
    ))
}

fn chat_request(json: &str) -> Request<Body> {
    Request::post("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let app = make_app();
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
}

// =============================================================================
// POST /api/chat
// =============================================================================

#[tokio::test]
async fn test_chat_round_trip_echoes_session_id() {
    let app = make_empty_app();
    let resp = app
        .oneshot(chat_request(r#"{"query":"oi","session_id":"abc"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert!(!body.response.is_empty());
    assert_eq!(body.session_id, "abc");
}

#[tokio::test]
async fn test_chat_without_session_id_coins_one() {
    let app = make_empty_app();
    let resp = app
        .oneshot(chat_request(r#"{"query":"oi"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert!(!body.session_id.is_empty());
}

#[tokio::test]
async fn test_chat_empty_query_is_bad_request() {
    let app = make_app();
    let resp = app
        .oneshot(chat_request(r#"{"query":"","session_id":"abc"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_chat_missing_query_is_client_error() {
    let app = make_app();
    let resp = app
        .oneshot(chat_request(r#"{"session_id":"abc"}"#))
        .await
        .unwrap();
    // Body deserialization failure surfaces as a 4xx from axum's Json extractor.
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_chat_malformed_session_id_is_bad_request() {
    let app = make_app();
    let resp = app
        .oneshot(chat_request(r#"{"query":"oi","session_id":"bad id!"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(resp).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "bad_request");
    assert!(body["detail"].as_str().unwrap().contains("session id"));
}

#[tokio::test]
async fn test_chat_ambiguous_question_clarifies() {
    let app = make_app();
    let resp = app
        .oneshot(chat_request(
            r#"{"query":"how do I set up an email signature","session_id":"s1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    for label in ["Webmail", "Outlook", "Thunderbird"] {
        assert!(body.response.contains(label), "missing {label}");
    }
    // Enumeration only, no answer content.
    assert!(!body.response.contains("File > Options"));
}

#[tokio::test]
async fn test_chat_clarify_then_selection_answers() {
    let state = make_state(
        Arc::new(StaticRetriever::new(email_candidates())),
        Arc::new(CannedGenerator::new("Here is how:")),
    );

    let app1 = create_router(state.clone());
    let resp1 = app1
        .oneshot(chat_request(
            r#"{"query":"how do I set up an email signature","session_id":"s1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp1.status(), StatusCode::OK);

    // Same shared state: the clarify turn is in this session's history.
    let app2 = create_router(state);
    let resp2 = app2
        .oneshot(chat_request(r#"{"query":"Outlook","session_id":"s1"}"#))
        .await
        .unwrap();
    assert_eq!(resp2.status(), StatusCode::OK);
    let bytes = body_bytes(resp2).await;
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert!(!body.response.contains("Which one do you mean"));
    assert!(body.response.contains("File > Options"));
}

#[tokio::test]
async fn test_chat_no_match_returns_escalation() {
    let app = make_empty_app();
    let resp = app
        .oneshot(chat_request(
            r#"{"query":"how do I fix the coffee machine","session_id":"s1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert!(body
        .response
        .contains("the IT service desk at helpdesk@example.com"));
}

#[tokio::test]
async fn test_chat_retrieval_outage_still_200() {
    let app = create_router(make_state(
        Arc::new(FailingRetriever),
        Arc::new(CannedGenerator::new("unused")),
    ));
    let resp = app
        .oneshot(chat_request(
            r#"{"query":"how do I reset my password","session_id":"s1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let body: ChatResponseBody = serde_json::from_slice(&bytes).unwrap();
    assert!(body.response.contains("temporarily unavailable"));
}

// =============================================================================
// GET /api/chat/{session_id}/history
// =============================================================================

#[tokio::test]
async fn test_history_round_trip() {
    let state = make_state(
        Arc::new(StaticRetriever::empty()),
        Arc::new(CannedGenerator::new("Hello!")),
    );

    let app1 = create_router(state.clone());
    app1.oneshot(chat_request(r#"{"query":"oi","session_id":"s1"}"#))
        .await
        .unwrap();

    let app2 = create_router(state);
    let resp = app2
        .oneshot(
            Request::get("/api/chat/s1/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let body: HistoryResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.session_id, "s1");
    assert_eq!(body.turns.len(), 2);
    assert_eq!(body.turns[0].role, Role::User);
    assert_eq!(body.turns[0].content, "oi");
    assert_eq!(body.turns[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_history_unknown_session_is_empty() {
    let app = make_app();
    let resp = app
        .oneshot(
            Request::get("/api/chat/never-seen/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let body: HistoryResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(body.turns.is_empty());
}

// =============================================================================
// DELETE /api/chat/{session_id}/history
// =============================================================================

#[tokio::test]
async fn test_clear_existing_session_204_empty_body() {
    let state = make_state(
        Arc::new(StaticRetriever::empty()),
        Arc::new(CannedGenerator::new("Hello!")),
    );

    let app1 = create_router(state.clone());
    app1.oneshot(chat_request(r#"{"query":"oi","session_id":"abc"}"#))
        .await
        .unwrap();

    let app2 = create_router(state);
    let resp = app2
        .oneshot(
            Request::delete("/api/chat/abc/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let bytes = body_bytes(resp).await;
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_clear_unknown_session_404() {
    let app = make_app();
    let resp = app
        .oneshot(
            Request::delete("/api/chat/never-seen/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = body_bytes(resp).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "not_found");
    assert!(body["detail"].as_str().unwrap().contains("never-seen"));
}

#[tokio::test]
async fn test_clear_twice_is_204_then_404() {
    let state = make_state(
        Arc::new(StaticRetriever::empty()),
        Arc::new(CannedGenerator::new("Hello!")),
    );

    let app = create_router(state.clone());
    app.oneshot(chat_request(r#"{"query":"oi","session_id":"abc"}"#))
        .await
        .unwrap();

    let resp1 = create_router(state.clone())
        .oneshot(
            Request::delete("/api/chat/abc/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp1.status(), StatusCode::NO_CONTENT);

    let resp2 = create_router(state.clone())
        .oneshot(
            Request::delete("/api/chat/abc/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp2.status(), StatusCode::NOT_FOUND);

    // History is empty after either clear.
    let resp3 = create_router(state)
        .oneshot(
            Request::get("/api/chat/abc/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = body_bytes(resp3).await;
    let body: HistoryResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(body.turns.is_empty());
}

// =============================================================================
// Session state machine: New -> Active -> Cleared -> Active
// =============================================================================

#[tokio::test]
async fn test_session_lifecycle() {
    let state = make_state(
        Arc::new(StaticRetriever::empty()),
        Arc::new(CannedGenerator::new("Hello!")),
    );

    // New -> Active.
    create_router(state.clone())
        .oneshot(chat_request(r#"{"query":"oi","session_id":"life"}"#))
        .await
        .unwrap();

    // Active loops.
    create_router(state.clone())
        .oneshot(chat_request(r#"{"query":"bom dia","session_id":"life"}"#))
        .await
        .unwrap();

    // Cleared.
    let resp = create_router(state.clone())
        .oneshot(
            Request::delete("/api/chat/life/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Active again on the next message.
    create_router(state.clone())
        .oneshot(chat_request(r#"{"query":"oi","session_id":"life"}"#))
        .await
        .unwrap();

    let resp = create_router(state)
        .oneshot(
            Request::get("/api/chat/life/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = body_bytes(resp).await;
    let body: HistoryResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.turns.len(), 2);
}
