//! DDL applied at startup.

/// `users` holds login credentials and the outstanding password-reset token.
/// Only the SHA-256 of a reset token is stored; expiry is unix seconds.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    name TEXT NULL,
    password_hash TEXT NOT NULL,
    reset_token_hash TEXT NULL,
    reset_token_expiry INTEGER NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_reset_token_hash ON users(reset_token_hash);
"#;
