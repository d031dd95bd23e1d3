#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use paceline_backend::{
    config::Config, repositories::MemoryStore, router, services::tracker::SessionTracker,
    state::AppState, types::UserId, utils::jwt,
};

pub const TEST_JWT_SECRET: &str = "paceline-test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        port: 0,
    }
}

/// Full application router over a fresh in-memory store.
pub fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let tracker = Arc::new(SessionTracker::new(store.clone(), store));
    router(AppState::new(tracker, test_config()))
}

pub fn bearer(user_id: UserId) -> String {
    let token =
        jwt::issue_token(user_id, TEST_JWT_SECRET, Duration::hours(1)).expect("issue token");
    format!("Bearer {token}")
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Registers a session for `user` in a fresh event and returns its id.
pub async fn register_session(app: &Router, auth: &str) -> String {
    let event_id = uuid::Uuid::new_v4();
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/events/{event_id}/register"),
        Some(auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["id"].as_str().expect("session id").to_string()
}

/// Registers and starts a session, returning its id.
pub async fn start_session(app: &Router, auth: &str) -> String {
    let session_id = register_session(app, auth).await;
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/sessions/{session_id}/start"),
        Some(auth),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "start failed: {body}");
    session_id
}
