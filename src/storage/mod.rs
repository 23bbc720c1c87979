//! Storage collaborator - key/value persistence behind an async trait
//!
//! The core reads categories, letter frequencies and round configs once at
//! startup and may save cache statistics. Everything goes through [`Storage`],
//! so the backend can be swapped without touching generation code.
//!
//! Backends:
//! - [`MemoryStorage`] - HashMap behind a lock (tests, embedding)
//! - [`JsonFileStorage`] - one `<key>.json` file per key in a directory

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Well-known storage keys
pub mod keys {
    pub const CATEGORIES: &str = "categories";
    pub const LETTER_FREQUENCIES: &str = "letter_frequencies";
    pub const ROUND_CONFIGS: &str = "round_configs";
    pub const CACHE_STATS: &str = "cache_stats";
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key/value persistence used by the core
#[async_trait]
pub trait Storage: Send + Sync {
    /// Raw payload stored under `key`, `None` if nothing was saved yet
    async fn load(&self, key: &str) -> StorageResult<Option<String>>;
    async fn save(&self, key: &str, data: &str) -> StorageResult<()>;
}

/// Load and decode a JSON payload
pub async fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> StorageResult<Option<T>> {
    match storage.load(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and save a JSON payload
pub async fn save_json<T: Serialize + Sync + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value)?;
    storage.save(key, &raw).await
}

fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style preload
    pub fn with_entry(self, key: &str, data: impl Into<String>) -> Self {
        self.entries.write().insert(key.to_string(), data.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    async fn save(&self, key: &str, data: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().insert(key.to_string(), data.to_string());
        Ok(())
    }
}

// ============================================================================
// JSON file backend
// ============================================================================

/// Stores each key as `<root>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                debug!(key, path = %path.display(), bytes = raw.len(), "Loaded storage key");
                Ok(Some(raw))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, data: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        // Write-then-rename so readers never see a half-written file
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(key, path = %path.display(), bytes = data.len(), "Saved storage key");
        Ok(())
    }
}
