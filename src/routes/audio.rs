// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Narration routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Story, StoryPatch};
use crate::routes::stories::{load_story, patch_story};
use crate::services::story_flows::NarrateStoryInput;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/audio/{id}", post(narrate_story))
}

/// Query parameters for narration.
#[derive(Debug, Default, Deserialize)]
pub struct NarrateRequest {
    #[serde(default)]
    pub voice: Option<String>,
}

/// Narrate a stored story and attach the audio to it.
async fn narrate_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(req): Query<NarrateRequest>,
) -> Result<Json<Story>> {
    let story = load_story(&state, &user, &id).await?;

    let narration = state
        .flows
        .narrate_story(NarrateStoryInput {
            text: format!("{}\n\n{}", story.title, story.content),
            voice: req.voice,
        })
        .await?;

    let patch = StoryPatch {
        speech_generated: Some(true),
        audio_url: Some(narration.audio_url),
        ..StoryPatch::default()
    };
    Ok(Json(patch_story(&state, &user, &id, patch).await?))
}
