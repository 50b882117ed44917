use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::{KeyValueStore, SEARCH_HISTORY};
use crate::error::{RelayError, Result};
use crate::models::history::HistoryEntry;

/// Bounded search log kept in the key-value store, oldest entries first.
pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    pub async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        match self.store.get(SEARCH_HISTORY).await? {
            Some(Value::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => {
                warn!("Search history has unexpected shape: {}", other);
                Ok(Vec::new())
            }
        }
    }

    /// Append an entry, evicting from the front once over the limit.
    pub async fn store(&self, entry: HistoryEntry) -> Result<()> {
        if !entry.is_valid() {
            return Err(RelayError::InvalidRequest(
                "history entry needs a video id and a search term".to_string(),
            ));
        }

        let mut history = self.entries().await?;
        history.push(entry);
        if history.len() > self.limit {
            let excess = history.len() - self.limit;
            history.drain(..excess);
        }

        let value = serde_json::to_value(&history)
            .map_err(|e| RelayError::StorageUnavailable(e.to_string()))?;
        self.store.set(SEARCH_HISTORY, value).await?;
        debug!("Search history now holds {} entries", history.len());
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&[SEARCH_HISTORY]).await
    }
}
