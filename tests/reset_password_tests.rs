// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password reset endpoint tests.
//!
//! The token is single-use and time-limited; on any rejection the account
//! record must be left exactly as it was.

use axum::http::StatusCode;
use serde_json::json;
use story_spark::services::password::{hash_token, verify_password};
use story_spark::time_utils::now_unix;

mod common;
use common::{post_json, register_user, send, TEST_PASSWORD};

const NEW_PASSWORD: &str = "a brand new secret";

#[tokio::test]
async fn test_reset_with_valid_token() {
    let (app, state) = common::create_test_app().await;
    let user = register_user(&state, "luna@example.com").await;

    let token = state
        .accounts
        .request_password_reset("luna@example.com")
        .await
        .unwrap()
        .expect("token issued for known email");

    let (status, body) = send(
        &app,
        post_json(
            "/api/reset-password",
            json!({ "token": token, "newPassword": NEW_PASSWORD }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password has been reset successfully");

    let after = state.accounts.db().get_user(&user.id).await.unwrap().unwrap();
    assert_ne!(after.password_hash, user.password_hash);
    assert!(verify_password(NEW_PASSWORD, &after.password_hash));
    assert_eq!(after.reset_token_hash, None);
    assert_eq!(after.reset_token_expiry, None);

    // The old password no longer works, the new one does
    assert!(state
        .accounts
        .login("luna@example.com", TEST_PASSWORD)
        .await
        .is_err());
    assert!(state
        .accounts
        .login("luna@example.com", NEW_PASSWORD)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_token_is_single_use() {
    let (app, state) = common::create_test_app().await;
    register_user(&state, "sol@example.com").await;

    let token = state
        .accounts
        .request_password_reset("sol@example.com")
        .await
        .unwrap()
        .unwrap();
    let request = || {
        post_json(
            "/api/reset-password",
            json!({ "token": token, "newPassword": NEW_PASSWORD }),
        )
    };

    let (first, _) = send(&app, request()).await;
    assert_eq!(first, StatusCode::OK);

    let (second, body) = send(&app, request()).await;
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_expired_token_leaves_record_unchanged() {
    let (app, state) = common::create_test_app().await;
    let user = register_user(&state, "mar@example.com").await;

    let token = "expired-token";
    state
        .accounts
        .db()
        .set_reset_token(&user.id, &hash_token(token), now_unix() - 1)
        .await
        .unwrap();
    let before = state.accounts.db().get_user(&user.id).await.unwrap().unwrap();

    let (status, body) = send(
        &app,
        post_json(
            "/api/reset-password",
            json!({ "token": token, "newPassword": NEW_PASSWORD }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "Invalid or expired token");

    let after = state.accounts.db().get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_unknown_token_rejected() {
    let (app, state) = common::create_test_app().await;
    let user = register_user(&state, "rio@example.com").await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/reset-password",
            json!({ "token": "never-issued", "newPassword": NEW_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let after = state.accounts.db().get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(after.password_hash, user.password_hash);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (app, _) = common::create_test_app().await;

    for body in [
        json!({}),
        json!({ "token": "abc" }),
        json!({ "newPassword": NEW_PASSWORD }),
        json!({ "token": "", "newPassword": NEW_PASSWORD }),
    ] {
        let (status, json) = send(&app, post_json("/api/reset-password", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Token and new password are required");
    }
}

#[tokio::test]
async fn test_short_password_keeps_token() {
    let (app, state) = common::create_test_app().await;
    let user = register_user(&state, "nube@example.com").await;
    let token = state
        .accounts
        .request_password_reset("nube@example.com")
        .await
        .unwrap()
        .unwrap();

    let (status, _) = send(
        &app,
        post_json(
            "/api/reset-password",
            json!({ "token": token, "newPassword": "short" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let after = state.accounts.db().get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(after.password_hash, user.password_hash);
    assert!(after.reset_token_hash.is_some());
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let (app, state) = common::create_test_app().await;
    register_user(&state, "luz@example.com").await;

    let (known, known_body) = send(
        &app,
        post_json("/api/forgot-password", json!({ "email": "luz@example.com" })),
    )
    .await;
    let (unknown, unknown_body) = send(
        &app,
        post_json("/api/forgot-password", json!({ "email": "nadie@example.com" })),
    )
    .await;

    assert_eq!(known, StatusCode::OK);
    assert_eq!(unknown, StatusCode::OK);
    assert_eq!(known_body, unknown_body);

    let (missing, _) = send(&app, post_json("/api/forgot-password", json!({}))).await;
    assert_eq!(missing, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_database_failure_is_generic_500() {
    let (app, state) = common::create_test_app().await;
    register_user(&state, "sol@example.com").await;

    state.accounts.db().close().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/reset-password",
            json!({ "token": "deadbeef", "newPassword": NEW_PASSWORD }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    // No driver detail leaks to the client
    assert_eq!(body["message"], "Internal server error");
}
