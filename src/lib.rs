// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Story Spark: AI-written children's stories
//!
//! This crate provides the backend API: accounts and password reset,
//! story generation/extension/illustration/narration through Gemini, and a
//! per-user story store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use services::{AccountService, GeminiClient, StoryFlows};
use store::StoryStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub accounts: AccountService,
    pub flows: StoryFlows<GeminiClient>,
    pub stories: StoryStore,
}
