// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard and session tests.
//!
//! These tests verify that:
//! 1. Protected API paths answer 401 JSON without a session
//! 2. Protected page paths redirect to login with a callback URL
//! 3. Public paths are never guarded
//! 4. Cookie and bearer sessions both pass the guard

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use story_spark::middleware::auth::SESSION_COOKIE;
use tower::ServiceExt;

mod common;
use common::{bearer, post_json, register_user, send, TEST_PASSWORD};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_api_without_session_is_unauthorized() {
    let (app, _) = common::create_test_app().await;

    for uri in ["/api/stories", "/api/users/me", "/api/stories/abc"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_page_without_session_redirects_to_login() {
    let (app, _) = common::create_test_app().await;

    let response = app.oneshot(get("/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login?callbackUrl=%2Fdashboard"
    );
}

#[tokio::test]
async fn test_redirect_keeps_query_string() {
    let (app, _) = common::create_test_app().await;

    let response = app.oneshot(get("/stories/42?tab=audio")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login?callbackUrl=%2Fstories%2F42%3Ftab%3Daudio"
    );
}

#[tokio::test]
async fn test_prefix_match_is_by_segment() {
    let (app, _) = common::create_test_app().await;

    // Looks like /stories but is a different path; falls through to 404
    let response = app.oneshot(get("/storiesabc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_paths_not_guarded() {
    let (app, _) = common::create_test_app().await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    // Reaches the handler, which rejects the empty body itself
    let (status, body) = send(&app, post_json("/api/reset-password", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Token and new password are required");
}

#[tokio::test]
async fn test_security_headers_on_guarded_responses() {
    let (app, _) = common::create_test_app().await;

    // Rejections from the guard carry the headers too
    let response = app.oneshot(get("/api/stories")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let headers = response.headers();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    assert_eq!(headers.get("Referrer-Policy").unwrap(), "no-referrer");
    assert_eq!(headers.get("Cache-Control").unwrap(), "no-store");
}

#[tokio::test]
async fn test_bearer_session_passes() {
    let (app, state) = common::create_test_app().await;
    let user = register_user(&state, "luna@example.com").await;

    let request = Request::builder()
        .uri("/api/users/me")
        .header(header::AUTHORIZATION, bearer(&state, &user.id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id);
    assert_eq!(body["email"], "luna@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let (app, _) = common::create_test_app().await;

    let request = Request::builder()
        .uri("/api/stories")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_cookie_opens_protected_routes() {
    let (app, state) = common::create_test_app().await;
    register_user(&state, "sol@example.com").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "sol@example.com", "password": TEST_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE}=")));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    // Test frontend is plain http
    assert!(!set_cookie.contains("Secure"));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/api/stories")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (app, state) = common::create_test_app().await;
    register_user(&state, "mar@example.com").await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({ "email": "mar@example.com", "password": "wrong password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight_for_frontend() {
    let (app, _) = common::create_test_app().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/stories")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
}
