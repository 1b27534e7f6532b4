//! Persisted state stores
//!
//! Bookmarks and the cached layout are small JSON documents kept under
//! fixed keys. The store is injected into whatever needs it:
//! - `MemoryStore` for tests and throwaway sessions
//! - `FileStore` for a single local user (one file per key)
//! - `RedisStore` when the gateway runs next to a Redis instance

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Key/value storage for persisted client state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the raw value stored under a key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under a key
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key, returning whether it existed
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

/// Read and deserialize a JSON value
pub async fn get_json<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON value
pub async fn set_json<T: Serialize + ?Sized>(store: &dyn StateStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|e| AppError::StorageFailure {
        message: format!("Failed to serialize value for '{}': {}", key, e),
    })?;
    store.set(key, &json).await
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create the store, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| AppError::StorageFailure {
            message: format!("Failed to create state directory {}: {}", dir.display(), e),
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::StorageFailure {
                message: format!("Failed to read '{}': {}", key, e),
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let dir = self.dir.clone();
        let target = path.clone();
        let value = value.to_owned();

        // Each write stages into its own temp file, then renames over the key
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(value.as_bytes())?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal {
            message: format!("State write task failed: {}", e),
        })?
        .map_err(|e| AppError::StorageFailure {
            message: format!("Failed to write '{}': {}", key, e),
        })?;

        debug!(key, path = %path.display(), "State written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::StorageFailure {
                message: format!("Failed to remove '{}': {}", key, e),
            }),
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

/// Redis-backed store
pub struct RedisStore {
    connection: RwLock<MultiplexedConnection>,
    key_prefix: String,
}

impl RedisStore {
    /// Connect to Redis
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = Client::open(url).map_err(|e| AppError::StorageFailure {
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::StorageFailure {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self {
            connection: RwLock::new(connection),
            key_prefix: key_prefix.into(),
        })
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;
        let value: Option<String> = conn.get(&full_key).await?;
        debug!(key = %full_key, hit = value.is_some(), "State read");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;
        let _: () = conn.set(&full_key, value).await?;
        debug!(key = %full_key, "State written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let full_key = self.key(key);
        let mut conn = self.connection.write().await;
        let deleted: i32 = conn.del(&full_key).await?;
        Ok(deleted > 0)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Open the store selected by configuration
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn StateStore>> {
    let store: Arc<dyn StateStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryStore::new()),
        "file" => Arc::new(FileStore::open(&config.dir).await?),
        "redis" => {
            let url = config.redis_url.as_deref().ok_or_else(|| AppError::Configuration {
                message: "storage.redis_url is required for the redis backend".to_string(),
            })?;
            Arc::new(RedisStore::connect(url, config.key_prefix.clone()).await?)
        }
        other => {
            return Err(AppError::Configuration {
                message: format!("Unknown storage backend: {}", other),
            })
        }
    };

    info!(backend = store.backend(), "State store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        signature: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        tokio_test::assert_ok!(store.set("k", "v").await);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let doc = Doc { signature: "abc".into(), count: 3 };
        set_json(&store, "savedNet:layout:v1", &doc).await.unwrap();

        let back: Option<Doc> = get_json(&store, "savedNet:layout:v1").await.unwrap();
        assert_eq!(back, Some(doc));
        assert!(dir.path().join("savedNet_layout_v1.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(!store.remove("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_concurrent_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).await.unwrap());

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set("layout", &format!("value-{}", i)).await })
            })
            .collect();
        for writer in writers {
            tokio_test::assert_ok!(writer.await.unwrap());
        }

        let value = store.get("layout").await.unwrap().unwrap();
        assert!(value.starts_with("value-"));

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1, "temp files must not be left behind");
    }

    #[tokio::test]
    async fn test_unknown_backend_rejected() {
        let config = StorageConfig {
            backend: "floppy".into(),
            ..Default::default()
        };
        assert!(open_store(&config).await.is_err());
    }
}
