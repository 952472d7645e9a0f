// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod story;
pub mod user;

pub use story::{NewStory, Story, StoryPatch};
pub use user::User;

use validator::ValidationError;

/// Field validator: rejects empty or whitespace-only strings with code `blank`.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
