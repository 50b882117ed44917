use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::fingerprint::RequestFingerprint;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }
}

/// In-memory search result cache with a fixed time-to-live.
///
/// Lookups treat stale entries as absent but leave them in place; only
/// [`ResponseCache::sweep`] deletes them.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // The map holds plain data, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, fingerprint: &RequestFingerprint) -> Option<Value> {
        let cache = self.lock();
        match cache.get(fingerprint.as_str()) {
            Some(entry) if entry.age(Instant::now()) < self.ttl => {
                debug!("Cache hit for {}", fingerprint);
                Some(entry.data.clone())
            }
            Some(_) => {
                debug!("Cache entry expired for {}", fingerprint);
                None
            }
            None => {
                debug!("Cache miss for {}", fingerprint);
                None
            }
        }
    }

    pub fn set(&self, fingerprint: &RequestFingerprint, data: Value) {
        self.lock().insert(
            fingerprint.as_str().to_string(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry whose age has reached the TTL. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut cache = self.lock();
        let before = cache.len();
        cache.retain(|_, entry| entry.age(now) < self.ttl);
        let removed = before - cache.len();
        if removed > 0 {
            debug!("Swept {} expired cache entries", removed);
        }
        removed
    }

    pub fn clear(&self, fingerprint: &RequestFingerprint) -> bool {
        self.lock().remove(fingerprint.as_str()).is_some()
    }

    pub fn clear_all(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run [`ResponseCache::sweep`] on a fixed interval until the handle is aborted.
pub fn spawn_sweeper(cache: Arc<ResponseCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            cache.sweep();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fingerprint::SearchKind;
    use serde_json::json;

    fn fp(term: &str) -> RequestFingerprint {
        RequestFingerprint::new(SearchKind::Transcript, "dQw4w9WgXcQ", term)
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get_returns_payload() {
        let cache = ResponseCache::new(Duration::from_secs(900));
        cache.set(&fp("never"), json!({"results": []}));
        assert_eq!(cache.get(&fp("never")), Some(json!({"results": []})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_absent_but_kept_until_sweep() {
        let cache = ResponseCache::new(Duration::from_secs(900));
        cache.set(&fp("gonna"), json!(1));

        tokio::time::advance(Duration::from_secs(899)).await;
        assert!(cache.get(&fp("gonna")).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&fp("gonna")).is_none());
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.sweep(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_refreshes_age() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.set(&fp("give"), json!("old"));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set(&fp("give"), json!("new"));
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get(&fp("give")), Some(json!("new")));
        assert_eq!(cache.sweep(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_and_clear_all() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.set(&fp("a"), json!(1));
        cache.set(&fp("b"), json!(2));

        assert!(cache.clear(&fp("a")));
        assert!(!cache.clear(&fp("a")));
        assert_eq!(cache.len(), 1);

        cache.clear_all();
        assert!(cache.get(&fp("b")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_evicts_in_background() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(10)));
        cache.set(&fp("up"), json!(1));
        let handle = spawn_sweeper(Arc::clone(&cache), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(cache.is_empty());

        handle.abort();
    }
}
