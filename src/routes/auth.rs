// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: register, login, logout and password reset.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::user::UserProfile;
use crate::routes::json::ApiJson;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/forgot-password", post(forgot_password))
        .route("/api/reset-password", post(reset_password))
}

/// `{message}` body used by the password endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// ─── Register / Login ────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>)> {
    req.validate()?;

    let user = state
        .accounts
        .register(&req.email, &req.password, req.name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Verify credentials and start a session (cookie + token in the body).
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let user = state.accounts.login(&req.email, &req.password).await?;

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));

    tracing::info!(user_id = %user.id, "Session started");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Drop the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = Cookie::build(SESSION_COOKIE)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

// ─── Password reset ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Issue a reset token. The answer is the same whether or not the account
/// exists.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let email = req
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    if let Some(token) = state.accounts.request_password_reset(&email).await? {
        // Mail delivery lives outside this service; the link is handed to the log.
        let reset_url = format!(
            "{}/reset-password?token={}",
            state.config.frontend_url.trim_end_matches('/'),
            token
        );
        tracing::debug!(reset_url = %reset_url, "Password reset link");
    }

    Ok(MessageResponse::new(
        "If an account exists for this email, a reset link has been sent",
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// POST /api/reset-password `{token, newPassword}` → `{message}`.
async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let (Some(token), Some(new_password)) = (
        req.token.filter(|t| !t.trim().is_empty()),
        req.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Token and new password are required".to_string(),
        ));
    };

    state.accounts.reset_password(&token, &new_password).await?;

    Ok(MessageResponse::new("Password has been reset successfully"))
}
