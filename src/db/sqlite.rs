// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite-backed user store.
//!
//! Provides typed operations for:
//! - Account creation and lookup (by id or email)
//! - Password-reset token issue and single-use consumption

use crate::db::schema::SQLITE_INIT;
use crate::error::AppError;
use crate::models::User;
use crate::time_utils::now_rfc3339;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, reset_token_hash, reset_token_expiry, created_at";

/// User database client.
#[derive(Clone)]
pub struct UserDb {
    pool: Pool<Sqlite>,
}

impl UserDb {
    /// Open (creating if needed) the database and apply the schema.
    ///
    /// `sqlite::memory:` gets a single long-lived connection, since every
    /// in-memory connection is its own database.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await?;
        let db = Self { pool };
        db.init_schema().await?;

        tracing::info!(url = database_url, "Connected to user database");
        Ok(db)
    }

    /// Close the pool. Later queries fail with a database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Execute the bundled DDL one statement at a time.
    async fn init_schema(&self) -> Result<(), AppError> {
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ─── Accounts ────────────────────────────────────────────────

    /// Insert a new user. The email must already be normalized.
    pub async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            password_hash: password_hash.to_string(),
            reset_token_hash: None,
            reset_token_expiry: None,
            created_at: now_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            other => other.into(),
        })?;

        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    // ─── Password reset ──────────────────────────────────────────

    /// Record a freshly issued reset token, replacing any previous one.
    pub async fn set_reset_token(
        &self,
        user_id: &str,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET reset_token_hash = ?, reset_token_expiry = ? WHERE id = ?")
            .bind(token_hash)
            .bind(expires_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Find the user holding `token_hash`, if the token has not expired at `now`.
    pub async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: i64,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_token_hash = ? AND reset_token_expiry > ?"
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Store the new password and clear the reset token in one statement.
    ///
    /// Guarded on the token hash so a token is consumed at most once; returns
    /// `false` when another request consumed it first.
    pub async fn complete_password_reset(
        &self,
        user_id: &str,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users \
             SET password_hash = ?, reset_token_hash = NULL, reset_token_expiry = NULL \
             WHERE id = ? AND reset_token_hash = ?",
        )
        .bind(new_password_hash)
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
