//! Persisted key-value state shared by the relay's handlers.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{RelayError, Result};

pub const CURRENT_VIDEO_ID: &str = "currentVideoId";
pub const SEARCH_HISTORY: &str = "searchHistory";
pub const AUTH_TOKEN: &str = "authToken";
pub const TOKEN_EXPIRATION: &str = "tokenExpiration";
pub const USER_PROFILE: &str = "userProfile";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, keys: &[&str]) -> Result<()>;

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(key)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut values = self.values.lock().await;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

/// A single JSON object on disk, rewritten on every change.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!("Ignoring unreadable state file {}", path.display());
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(RelayError::StorageUnavailable(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };
        debug!("Opened state file {} with {} keys", path.display(), values.len());
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    async fn flush(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RelayError::StorageUnavailable(e.to_string()))?;
            }
        }
        let content = serde_json::to_string_pretty(values)
            .map_err(|e| RelayError::StorageUnavailable(e.to_string()))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| RelayError::StorageUnavailable(format!("{}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value);
        self.flush(&values).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut values = self.values.lock().await;
        for key in keys {
            values.remove(*key);
        }
        self.flush(&values).await
    }
}
