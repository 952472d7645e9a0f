// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story Spark API Server
//!
//! Generates, extends, illustrates and narrates children's stories with
//! Gemini, and keeps each user's stories in a story store.

use std::sync::Arc;
use story_spark::{
    config::Config,
    db::UserDb,
    services::{AccountService, GeminiClient, ModelNames, StoryFlows},
    store::{FileStorage, StoryStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Story Spark API");

    // Initialize user database
    let db = UserDb::connect(&config.database_url).await?;
    let accounts = AccountService::new(db, config.reset_token_ttl_minutes);

    // Story storage: files when a data directory is configured
    let stories = match &config.story_data_dir {
        Some(dir) => StoryStore::new(Arc::new(FileStorage::new(dir)?)),
        None => {
            tracing::warn!("STORY_DATA_DIR not set, stories are kept in memory only");
            StoryStore::in_memory()
        }
    };

    let gemini = GeminiClient::new(&config.gemini_base_url, &config.gemini_api_key);
    let flows = StoryFlows::new(gemini, ModelNames::from_config(&config));
    tracing::info!(
        text_model = %config.text_model,
        image_model = %config.image_model,
        speech_model = %config.speech_model,
        "Gemini client initialized"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        accounts,
        flows,
        stories,
    });

    // Build router
    let app = story_spark::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("story_spark=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
