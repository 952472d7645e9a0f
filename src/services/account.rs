// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: registration, login and password reset.

use crate::db::UserDb;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::password::{generate_reset_token, hash_password, hash_token, verify_password};
use crate::time_utils::now_unix;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

const INVALID_RESET_TOKEN: &str = "Invalid or expired token";

/// Account operations over the user database.
#[derive(Clone)]
pub struct AccountService {
    db: UserDb,
    reset_token_ttl_secs: i64,
}

impl AccountService {
    pub fn new(db: UserDb, reset_token_ttl_minutes: i64) -> Self {
        Self {
            db,
            reset_token_ttl_secs: reset_token_ttl_minutes * 60,
        }
    }

    pub fn db(&self) -> &UserDb {
        &self.db
    }

    /// Create an account. Fails with `Conflict` if the email is taken.
    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> Result<User> {
        check_password(password)?;
        let email = normalize_email(email);
        let password_hash = hash_off_runtime(password).await?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let user = self.db.create_user(&email, name, &password_hash).await?;
        tracing::info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    /// Verify credentials and return the user.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .db
            .get_user_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_string();
        let stored = user.password_hash.clone();
        let matches = blocking(move || Ok(verify_password(&password, &stored))).await?;
        if !matches {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Issue a reset token for `email`.
    ///
    /// Returns the raw token when the account exists; callers must not reveal
    /// whether it did.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>> {
        let Some(user) = self.db.get_user_by_email(&normalize_email(email)).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = generate_reset_token()?;
        let expires_at = now_unix() + self.reset_token_ttl_secs;
        self.db
            .set_reset_token(&user.id, &hash_token(&token), expires_at)
            .await?;

        tracing::info!(user_id = %user.id, expires_at, "Password reset token issued");
        Ok(Some(token))
    }

    /// Replace the password of the account holding a valid `token`, and
    /// consume the token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let token_hash = hash_token(token.trim());

        let user = self
            .db
            .find_by_reset_token(&token_hash, now_unix())
            .await?
            .ok_or_else(|| AppError::BadRequest(INVALID_RESET_TOKEN.to_string()))?;

        check_password(new_password)?;
        let password_hash = hash_off_runtime(new_password).await?;

        let consumed = self
            .db
            .complete_password_reset(&user.id, &token_hash, &password_hash)
            .await?;
        if !consumed {
            // Another request used the token between lookup and update.
            return Err(AppError::BadRequest(INVALID_RESET_TOKEN.to_string()));
        }

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}

/// Run CPU-bound work (Argon2) on the blocking pool so it does not stall
/// the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password task failed: {}", e)))?
}

async fn hash_off_runtime(password: &str) -> Result<String> {
    let password = password.to_string();
    blocking(move || hash_password(&password)).await
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
