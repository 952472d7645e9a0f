// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod audio;
pub mod gemini;
pub mod password;
pub mod prompts;
pub mod story_flows;

pub use account::AccountService;
pub use gemini::{GeminiClient, GenerativeModel};
pub use story_flows::{ModelNames, StoryFlows};
