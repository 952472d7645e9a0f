// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use story_spark::config::Config;
use story_spark::db::UserDb;
use story_spark::middleware::auth::create_jwt;
use story_spark::models::User;
use story_spark::routes::create_router;
use story_spark::services::{AccountService, GeminiClient, ModelNames, StoryFlows};
use story_spark::store::StoryStore;
use story_spark::AppState;
use tower::ServiceExt;

#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Create a test app backed by an in-memory database and story store.
///
/// The Gemini client points at `gemini_base_url`; pass the address of
/// [`spawn_fake_gemini`] for tests that reach the model.
#[allow(dead_code)]
pub async fn create_test_app_with_model(gemini_base_url: &str) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.gemini_base_url = gemini_base_url.to_string();

    let db = UserDb::connect(&config.database_url)
        .await
        .expect("Failed to open in-memory database");
    let accounts = AccountService::new(db, config.reset_token_ttl_minutes);
    let gemini = GeminiClient::new(&config.gemini_base_url, &config.gemini_api_key);
    let flows = StoryFlows::new(gemini, ModelNames::from_config(&config));

    let state = Arc::new(AppState {
        config,
        accounts,
        flows,
        stories: StoryStore::in_memory(),
    });

    (create_router(state.clone()), state)
}

/// Create a test app whose model endpoint is unreachable.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_model("http://127.0.0.1:9").await
}

/// Serve a canned `generateContent` answer for every model on a local port.
/// Returns the base URL.
#[allow(dead_code)]
pub async fn spawn_fake_gemini(answer: Value) -> String {
    spawn_slow_fake_gemini(answer, Duration::ZERO).await
}

/// Like [`spawn_fake_gemini`], but each answer is sent after `delay`.
#[allow(dead_code)]
pub async fn spawn_slow_fake_gemini(answer: Value, delay: Duration) -> String {
    let app = Router::new().route(
        "/models/{action}",
        post(move || {
            let answer = answer.clone();
            async move {
                tokio::time::sleep(delay).await;
                Json(answer)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake Gemini");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{addr}")
}

/// `generateContent` response whose only part is `text`.
#[allow(dead_code)]
pub fn text_answer(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Register a user with [`TEST_PASSWORD`].
#[allow(dead_code)]
pub async fn register_user(state: &AppState, email: &str) -> User {
    state
        .accounts
        .register(email, TEST_PASSWORD, Some("Test"))
        .await
        .expect("Failed to register user")
}

/// Bearer header value for a session of `user_id`.
#[allow(dead_code)]
pub fn bearer(state: &AppState, user_id: &str) -> String {
    let token = create_jwt(user_id, &state.config.jwt_signing_key).expect("Failed to sign JWT");
    format!("Bearer {token}")
}

/// Send a request and return status plus JSON body (`Value::Null` when empty).
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Build a JSON POST request.
#[allow(dead_code)]
pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
