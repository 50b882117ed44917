use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::storage::{KeyValueStore, CURRENT_VIDEO_ID};
use crate::error::Result;
use crate::utils::video_url::extract_video_id;

/// Works out which video a request is about.
pub struct VideoResolver {
    store: Arc<dyn KeyValueStore>,
}

impl VideoResolver {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Remember the video behind a navigation, if it is one. Returns the id stored.
    pub async fn observe_navigation(&self, url: &str) -> Result<Option<String>> {
        match extract_video_id(url) {
            Some(video_id) => {
                info!("Detected YouTube video: {}", video_id);
                self.store
                    .set(CURRENT_VIDEO_ID, Value::String(video_id.clone()))
                    .await?;
                Ok(Some(video_id))
            }
            None => {
                debug!("Navigation to non-video URL ignored: {}", url);
                Ok(None)
            }
        }
    }

    /// Explicit value first (a full URL is reduced to its id), then the last
    /// observed video.
    pub async fn resolve(&self, explicit: Option<&str>) -> Result<Option<String>> {
        if let Some(explicit) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            let video_id = extract_video_id(explicit).unwrap_or_else(|| explicit.to_string());
            return Ok(Some(video_id));
        }
        let stored = self
            .store
            .get_string(CURRENT_VIDEO_ID)
            .await?
            .filter(|s| !s.is_empty());
        Ok(stored)
    }
}
