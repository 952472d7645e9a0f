// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key/value persistence for story collections.
//!
//! The backend interface mirrors browser local storage (`getItem`,
//! `setItem`, `removeItem` over string values) so the story store can sit
//! on top of any medium:
//! - `MemoryStorage` keeps values in a concurrent map (tests, ephemeral runs)
//! - `FileStorage` keeps one JSON file per key under a data directory

pub mod stories;

pub use stories::{StoryStore, STORAGE_KEY};

use dashmap::DashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Story storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// String key/value storage.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process storage.
#[derive(Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under `dir`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for storage, creating it if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        tracing::info!(dir = %dir.display(), "Using file-backed story storage");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem_for_key(key)))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        write_then_rename(&tmp, &path, value).map_err(|source| StoreError::Io { path, source })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

fn write_then_rename(tmp: &Path, path: &Path, value: &str) -> io::Result<()> {
    fs::write(tmp, value)?;
    fs::rename(tmp, path)
}

/// Map a storage key to a file stem. ASCII alphanumerics and `-` pass
/// through; every other byte becomes `_xx` (hex), which keeps the mapping
/// injective.
fn file_stem_for_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            stem.push(b as char);
        } else {
            stem.push_str(&format!("_{b:02x}"));
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_stem_is_path_safe() {
        assert_eq!(file_stem_for_key("story-spark-stories"), "story-spark-stories");
        assert_eq!(file_stem_for_key("a:b"), "a_3ab");
        assert_eq!(file_stem_for_key("../x"), "_2e_2e_2fx");
        assert_ne!(file_stem_for_key("a_b"), file_stem_for_key("a:b"));
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "[]").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("[]"));
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = TempDir::new().unwrap();

        let storage = FileStorage::new(dir.path()).unwrap();
        storage.set_item("story-spark-stories:u1", "[1]").unwrap();
        drop(storage);

        let reopened = FileStorage::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get_item("story-spark-stories:u1").unwrap().as_deref(),
            Some("[1]")
        );
        reopened.remove_item("story-spark-stories:u1").unwrap();
        reopened.remove_item("story-spark-stories:u1").unwrap();
        assert_eq!(reopened.get_item("story-spark-stories:u1").unwrap(), None);
    }
}
