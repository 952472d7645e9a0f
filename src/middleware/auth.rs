// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication and route guarding.
//!
//! Sessions are HS256 JWTs carried in the `story_spark_token` cookie or an
//! `Authorization: Bearer` header. The guard only looks at protected path
//! prefixes; everything else passes through untouched.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "story_spark_token";

/// Session lifetime.
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60; // 30 days

/// Path prefixes that require a session.
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/dashboard",
    "/stories",
    "/profile",
    "/settings",
    "/api/stories",
    "/api/users",
    "/api/audio",
];

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// `path` equals a protected prefix or lies below one.
pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Guard protected routes.
///
/// Without a valid session, API paths get a JSON 401 and page paths are
/// redirected to the login page with the original location in
/// `callbackUrl`. With one, the `AuthUser` is attached to the request.
pub async fn route_guard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_protected(&path) {
        return next.run(request).await;
    }

    match authenticate(&jar, request.headers(), &state.config.jwt_signing_key) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None if is_api_path(&path) => {
            tracing::debug!(path = %path, "Rejected unauthenticated API request");
            AppError::Unauthorized.into_response()
        }
        None => {
            let callback = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(&path);
            let location = format!(
                "{}?callbackUrl={}",
                state.config.login_path,
                urlencoding::encode(callback)
            );
            tracing::debug!(path = %path, "Redirecting unauthenticated page request to login");
            Redirect::temporary(&location).into_response()
        }
    }
}

/// Resolve the session from cookie (preferred) or bearer header.
fn authenticate(jar: &CookieJar, headers: &HeaderMap, signing_key: &[u8]) -> Option<AuthUser> {
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))?
            .trim()
            .to_string(),
    };

    match verify_jwt(&token, signing_key) {
        Ok(claims) => Some(AuthUser {
            user_id: claims.sub,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Session token rejected");
            None
        }
    }
}

/// Decode and validate a session token.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> jsonwebtoken::errors::Result<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation).map(|data| data.claims)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
