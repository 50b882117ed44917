use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001";

/// Runtime settings for the relay.
///
/// Every field has a default, so an empty TOML file (or none at all) is a
/// valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the search backend, without a trailing slash
    pub backend_url: String,

    /// Sent as `X-Extension-Id` when requesting a session token
    pub extension_id: String,

    /// How long a cached search result stays valid
    pub cache_ttl_ms: u64,

    /// Interval of the background cache sweep
    pub sweep_interval_ms: u64,

    pub transcript_timeout_ms: u64,

    /// Object detection is slower upstream, so it gets a longer budget
    pub detection_timeout_ms: u64,

    /// Maximum number of search history entries kept
    pub history_limit: usize,

    /// Refuse searches without a valid session token
    pub require_auth: bool,

    /// Check result payloads against the expected schema
    pub validate_responses: bool,

    /// Where persisted state lives; in-memory only when unset
    pub state_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            extension_id: "vidify-cli".to_string(),
            cache_ttl_ms: 900_000,
            sweep_interval_ms: 300_000,
            transcript_timeout_ms: 30_000,
            detection_timeout_ms: 60_000,
            history_limit: 50,
            require_auth: false,
            validate_responses: true,
            state_file: None,
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(path).map_err(|e| {
                    RelayError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RelayError::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("VIDIFY_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Ok(id) = std::env::var("VIDIFY_EXTENSION_ID") {
            self.extension_id = id;
        }
        if let Ok(path) = std::env::var("VIDIFY_STATE_FILE") {
            self.state_file = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.backend_url).is_err() {
            return Err(RelayError::Config(format!(
                "backend_url is not a valid URL: {}",
                self.backend_url
            )));
        }
        if self.cache_ttl_ms == 0 || self.sweep_interval_ms == 0 {
            return Err(RelayError::Config(
                "cache_ttl_ms and sweep_interval_ms must be positive".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(RelayError::Config("history_limit must be positive".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn transcript_timeout(&self) -> Duration {
        Duration::from_millis(self.transcript_timeout_ms)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }
}
