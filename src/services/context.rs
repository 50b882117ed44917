use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::history::SearchHistory;
use super::resolver::VideoResolver;
use super::storage::{
    JsonFileStore, KeyValueStore, MemoryStore, AUTH_TOKEN, TOKEN_EXPIRATION, USER_PROFILE,
};
use crate::api::backend::BackendGateway;
use crate::config::Config;
use crate::error::Result;
use crate::models::cache::{spawn_sweeper, ResponseCache};
use crate::models::session::SessionToken;

/// Everything a request handler needs, created once at start-up.
///
/// Dropping the context (or calling [`ExtensionContext::shutdown`]) stops the
/// background cache sweep.
pub struct ExtensionContext {
    pub config: Config,
    pub cache: Arc<ResponseCache>,
    pub store: Arc<dyn KeyValueStore>,
    pub gateway: BackendGateway,
    pub resolver: VideoResolver,
    pub history: SearchHistory,
    sweeper: Option<JoinHandle<()>>,
}

impl ExtensionContext {
    /// Must be called from inside a Tokio runtime.
    pub fn start(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
        let sweeper = spawn_sweeper(Arc::clone(&cache), config.sweep_interval());
        let gateway = BackendGateway::new(&config)?;

        info!(
            "Relay started against {} (cache ttl {} ms, sweep every {} ms)",
            config.backend_url, config.cache_ttl_ms, config.sweep_interval_ms
        );

        Ok(Self {
            resolver: VideoResolver::new(Arc::clone(&store)),
            history: SearchHistory::new(Arc::clone(&store), config.history_limit),
            config,
            cache,
            store,
            gateway,
            sweeper: Some(sweeper),
        })
    }

    /// Start with the store the config asks for: a JSON file, or memory.
    pub async fn open(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.state_file {
            Some(path) => Arc::new(JsonFileStore::open(path.clone()).await?),
            None => Arc::new(MemoryStore::new()),
        };
        Self::start(config, store)
    }

    pub fn shutdown(mut self) {
        self.stop_sweeper();
        info!("Relay shut down");
    }

    fn stop_sweeper(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
            debug!("Cache sweep stopped");
        }
    }

    /// The stored session, if one exists and has not expired.
    pub async fn session(&self) -> Result<Option<SessionToken>> {
        let Some(token) = self.store.get_string(AUTH_TOKEN).await? else {
            return Ok(None);
        };
        let expires_at = self
            .store
            .get(TOKEN_EXPIRATION)
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let session = SessionToken { token, expires_at };
        if session.is_expired() {
            debug!("Stored session expired at {}", expires_at);
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn save_session(&self, session: &SessionToken) -> Result<()> {
        self.store
            .set(AUTH_TOKEN, Value::String(session.token.clone()))
            .await?;
        self.store
            .set(TOKEN_EXPIRATION, json!(session.expires_at))
            .await
    }

    pub async fn clear_session(&self) -> Result<()> {
        self.store
            .remove(&[AUTH_TOKEN, TOKEN_EXPIRATION, USER_PROFILE])
            .await
    }
}

impl Drop for ExtensionContext {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}
