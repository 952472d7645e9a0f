// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Story collection store.
//!
//! A collection is one JSON array under one storage key. Every operation
//! reads the whole array, changes it, and writes the whole array back.
//! Writers of the same key are serialized in-process; across processes the
//! last write wins.

use super::{MemoryStorage, StorageBackend, StoreError};
use crate::models::{NewStory, Story, StoryPatch};
use crate::time_utils::now_rfc3339;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// Storage key of the story collection.
pub const STORAGE_KEY: &str = "story-spark-stories";

/// Story CRUD over a storage backend.
#[derive(Clone)]
pub struct StoryStore {
    backend: Arc<dyn StorageBackend>,
    /// Per-key write locks
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl StoryStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Storage key holding one user's collection.
    pub fn user_key(user_id: &str) -> String {
        format!("{STORAGE_KEY}:{user_id}")
    }

    /// All stories under `key`, newest first.
    pub fn list(&self, key: &str) -> Result<Vec<Story>, StoreError> {
        self.load(key)
    }

    /// Look up a story by id.
    pub fn get(&self, key: &str, id: &str) -> Result<Option<Story>, StoreError> {
        Ok(self.load(key)?.into_iter().find(|s| s.id == id))
    }

    /// Insert a story with a fresh id and creation timestamp.
    pub fn add(&self, key: &str, new_story: NewStory) -> Result<Story, StoreError> {
        let story = new_story.into_story(uuid::Uuid::new_v4().to_string(), now_rfc3339());
        let added = story.clone();
        self.modify(key, move |stories| {
            stories.insert(0, story);
            (added, true)
        })
    }

    /// Merge `patch` into the story with `id`. `None` if no such story.
    pub fn update(
        &self,
        key: &str,
        id: &str,
        patch: StoryPatch,
    ) -> Result<Option<Story>, StoreError> {
        self.update_with(key, id, |story| patch.apply(story))
    }

    /// Change the story with `id` in place while holding the key's lock,
    /// so `f` sees the current record rather than an earlier read.
    /// `None` if no such story.
    pub fn update_with(
        &self,
        key: &str,
        id: &str,
        f: impl FnOnce(&mut Story),
    ) -> Result<Option<Story>, StoreError> {
        self.modify(key, |stories| match stories.iter_mut().find(|s| s.id == id) {
            Some(story) => {
                f(story);
                (Some(story.clone()), true)
            }
            None => (None, false),
        })
    }

    /// Drop the story with `id`. Returns whether it existed.
    pub fn remove(&self, key: &str, id: &str) -> Result<bool, StoreError> {
        self.modify(key, |stories| {
            let before = stories.len();
            stories.retain(|s| s.id != id);
            let removed = stories.len() != before;
            (removed, removed)
        })
    }

    /// Read-modify-write under the key's lock. `f` returns its result and
    /// whether the collection changed.
    fn modify<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Vec<Story>) -> (R, bool),
    ) -> Result<R, StoreError> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut stories = self.load(key)?;
        let (result, changed) = f(&mut stories);
        if changed {
            self.save(key, &stories)?;
        }
        Ok(result)
    }

    fn load(&self, key: &str) -> Result<Vec<Story>, StoreError> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(stories) => Ok(stories),
            Err(e) => {
                tracing::warn!(key, error = %e, "Unreadable story collection, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// An empty collection is removed rather than stored as `[]`.
    fn save(&self, key: &str, stories: &[Story]) -> Result<(), StoreError> {
        if stories.is_empty() {
            return self.backend.remove_item(key);
        }
        let raw = serde_json::to_string(stories)?;
        self.backend.set_item(key, &raw)
    }
}
