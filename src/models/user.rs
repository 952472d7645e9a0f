//! User credential record stored in SQLite.

use serde::Serialize;
use sqlx::FromRow;

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    /// UUID v4, also the JWT subject
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// Argon2id PHC string
    pub password_hash: String,
    /// SHA-256 (hex) of the outstanding reset token
    pub reset_token_hash: Option<String>,
    /// Unix seconds after which the reset token is rejected
    pub reset_token_expiry: Option<i64>,
    /// RFC3339
    pub created_at: String,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}
