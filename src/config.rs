// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;

/// Default Gemini REST endpoint (v1beta exposes structured output and TTS).
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS and password-reset links
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// SQLite connection string for the user table
    pub database_url: String,
    /// Directory for file-backed story storage; in-memory when unset
    pub story_data_dir: Option<PathBuf>,
    /// Where unauthenticated page requests are sent
    pub login_path: String,
    /// Lifetime of a password-reset token
    pub reset_token_ttl_minutes: i64,

    // --- Generative model ---
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub speech_model: String,
    /// Prebuilt voice used for narration when the request names none
    pub voice: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://story-spark.db".to_string()),
            story_data_dir: env::var("STORY_DATA_DIR").ok().map(PathBuf::from),
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            reset_token_ttl_minutes: parse_or("RESET_TOKEN_TTL_MINUTES", 60)?,

            gemini_api_key: env::var("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?,
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            text_model: env::var("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            image_model: env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash-preview-image-generation".to_string()),
            speech_model: env::var("GEMINI_SPEECH_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-preview-tts".to_string()),
            voice: env::var("GEMINI_VOICE").unwrap_or_else(|_| "Algenib".to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Config with fixed values, for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            story_data_dir: None,
            login_path: "/login".to_string(),
            reset_token_ttl_minutes: 60,
            gemini_api_key: "test_gemini_key".to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Algenib".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Session cookies are only marked `Secure` when the frontend is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("GEMINI_API_KEY", " test_key ");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("RESET_TOKEN_TTL_MINUTES", "15");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.gemini_api_key, "test_key");
        assert_eq!(config.reset_token_ttl_minutes, 15);
        assert_eq!(config.login_path, "/login");

        env::remove_var("RESET_TOKEN_TTL_MINUTES");
    }

    #[test]
    fn test_secure_cookies_follow_frontend_scheme() {
        let mut config = Config::test_default();
        assert!(!config.secure_cookies());

        config.frontend_url = "https://stories.example.com".to_string();
        assert!(config.secure_cookies());
    }
}
