// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story routes. Every handler works on the caller's own collection.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewStory, Story, StoryPatch};
use crate::routes::json::ApiJson;
use crate::services::story_flows::{ExtendStoryInput, GenerateStoryInput, IllustrateStoryInput};
use crate::store::{StoreError, StoryStore};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use validator::Validate;
use std::sync::Arc;

/// Story routes (the route guard requires a session for `/api/stories`).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stories", get(list_stories))
        .route("/api/stories/generate", post(generate_story))
        .route(
            "/api/stories/{id}",
            get(get_story).patch(update_story).delete(delete_story),
        )
        .route("/api/stories/{id}/extend", post(extend_story))
        .route("/api/stories/{id}/illustrate", post(illustrate_story))
}

/// Run a store operation on the blocking pool; file-backed storage does
/// synchronous I/O.
pub(crate) async fn with_store<T, F>(store: &StoryStore, f: F) -> Result<T>
where
    F: FnOnce(&StoryStore) -> std::result::Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| AppError::Storage(StoreError::Task(e.to_string()).to_string()))?
        .map_err(AppError::from)
}

/// Fetch one of the caller's stories or 404.
pub(crate) async fn load_story(state: &AppState, user: &AuthUser, id: &str) -> Result<Story> {
    let key = StoryStore::user_key(&user.user_id);
    let story_id = id.to_string();
    with_store(&state.stories, move |s| s.get(&key, &story_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Story {} not found", id)))
}

/// Merge a patch into one of the caller's stories or 404.
pub(crate) async fn patch_story(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    patch: StoryPatch,
) -> Result<Story> {
    let key = StoryStore::user_key(&user.user_id);
    let story_id = id.to_string();
    with_store(&state.stories, move |s| s.update(&key, &story_id, patch))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Story {} not found", id)))
}

// ─── CRUD ────────────────────────────────────────────────────

async fn list_stories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Story>>> {
    let key = StoryStore::user_key(&user.user_id);
    let stories = with_store(&state.stories, move |s| s.list(&key)).await?;
    Ok(Json(stories))
}

async fn get_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Story>> {
    Ok(Json(load_story(&state, &user, &id).await?))
}

async fn update_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<StoryPatch>,
) -> Result<Json<Story>> {
    patch.validate()?;
    Ok(Json(patch_story(&state, &user, &id, patch).await?))
}

async fn delete_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let key = StoryStore::user_key(&user.user_id);
    let story_id = id.clone();
    let removed = with_store(&state.stories, move |s| s.remove(&key, &story_id)).await?;
    if !removed {
        return Err(AppError::NotFound(format!("Story {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ─── Flows ───────────────────────────────────────────────────

/// Generate a story and add it to the caller's collection.
async fn generate_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<GenerateStoryInput>,
) -> Result<(StatusCode, Json<Story>)> {
    let generated = state.flows.generate_story(input.clone()).await?;

    let new_story = NewStory {
        theme: input.theme,
        character_name: input.character_name,
        character_traits: input.character_traits,
        title: generated.title,
        content: generated.story,
        image_url: None,
    };
    let key = StoryStore::user_key(&user.user_id);
    let story = with_store(&state.stories, move |s| s.add(&key, new_story)).await?;

    tracing::info!(user_id = %user.user_id, story_id = %story.id, "Story created");
    Ok((StatusCode::CREATED, Json(story)))
}

#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Append a generated continuation to a stored story.
async fn extend_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ExtendRequest>,
) -> Result<Json<Story>> {
    let story = load_story(&state, &user, &id).await?;

    let continuation = state
        .flows
        .extend_story(ExtendStoryInput {
            existing_story: story.content.clone(),
            continuation_prompt: req.prompt,
        })
        .await?;

    // Append to the record as stored now; the model call may have taken a
    // while and other writes to this story may have landed meanwhile.
    let key = StoryStore::user_key(&user.user_id);
    let story_id = id.clone();
    let addition = continuation.continuation.trim().to_string();
    let updated = with_store(&state.stories, move |s| {
        s.update_with(&key, &story_id, |story| {
            story.content = format!("{}\n\n{}", story.content.trim_end(), addition);
            story.extension_count = Some(story.extension_count.unwrap_or(0) + 1);
        })
    })
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Story {} not found", id)))?;

    Ok(Json(updated))
}

/// Generate a cover image for a stored story.
async fn illustrate_story(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Story>> {
    let story = load_story(&state, &user, &id).await?;

    let illustration = state
        .flows
        .illustrate_story(IllustrateStoryInput {
            title: story.title,
            theme: story.theme,
        })
        .await?;

    let patch = StoryPatch {
        image_url: Some(illustration.image_url),
        ..StoryPatch::default()
    };
    Ok(Json(patch_story(&state, &user, &id, patch).await?))
}
