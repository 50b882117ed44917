use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::context::ExtensionContext;
use super::storage::USER_PROFILE;
use crate::error::{RelayError, Result};
use crate::models::envelope::ResponseEnvelope;
use crate::models::fingerprint::{RequestFingerprint, SearchKind};
use crate::models::history::HistoryEntry;
use crate::models::results::result_count;
use crate::models::session::{unix_now, SessionToken};

/// A request from a UI surface, tagged by its `action` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    SearchTranscript {
        #[serde(default)]
        video_id: Option<String>,
        search_term: String,
    },
    #[serde(alias = "searchObject")]
    SearchObjects {
        #[serde(default)]
        video_id: Option<String>,
        #[serde(alias = "objectName")]
        search_term: String,
    },
    TableOfContents {
        #[serde(default)]
        video_id: Option<String>,
    },
    GetSearchHistory {},
    ClearCache {
        #[serde(default)]
        video_id: Option<String>,
        #[serde(default)]
        kind: Option<SearchKind>,
        #[serde(default)]
        search_term: Option<String>,
        #[serde(default)]
        clear_history: bool,
    },
    CheckAuth {},
    Login {},
    Logout {},
}

const ACTIONS: &[&str] = &[
    "searchTranscript",
    "searchObjects",
    "searchObject",
    "tableOfContents",
    "getSearchHistory",
    "clearCache",
    "checkAuth",
    "login",
    "logout",
];

/// Single entry point for UI requests. Every path ends in an envelope.
pub struct MessageRouter {
    ctx: Arc<ExtensionContext>,
}

impl MessageRouter {
    pub fn new(ctx: Arc<ExtensionContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ExtensionContext {
        &self.ctx
    }

    /// Handle a raw JSON message as sent over the wire.
    pub async fn handle_json(&self, raw: Value) -> ResponseEnvelope {
        let Some(action) = raw.get("action").and_then(|a| a.as_str()).map(str::to_string) else {
            return RelayError::InvalidRequest("missing action".to_string()).into();
        };

        match serde_json::from_value::<Message>(raw) {
            Ok(message) => self.handle(message).await,
            Err(e) if ACTIONS.contains(&action.as_str()) => {
                warn!("Malformed {} request: {}", action, e);
                RelayError::InvalidRequest(e.to_string()).into()
            }
            Err(_) => {
                warn!("Unknown action received: {}", action);
                RelayError::UnknownAction(action).into()
            }
        }
    }

    pub async fn handle(&self, message: Message) -> ResponseEnvelope {
        debug!("Routing {:?}", message);
        match self.dispatch(message).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Error processing request: {}", e);
                e.into()
            }
        }
    }

    async fn dispatch(&self, message: Message) -> Result<ResponseEnvelope> {
        match message {
            Message::SearchTranscript { video_id, search_term } => {
                self.search(SearchKind::Transcript, video_id.as_deref(), &search_term).await
            }
            Message::SearchObjects { video_id, search_term } => {
                self.search(SearchKind::Object, video_id.as_deref(), &search_term).await
            }
            Message::TableOfContents { video_id } => {
                self.search(SearchKind::Toc, video_id.as_deref(), "").await
            }
            Message::GetSearchHistory {} => self.search_history().await,
            Message::ClearCache {
                video_id,
                kind,
                search_term,
                clear_history,
            } => {
                self.clear_cache(video_id.as_deref(), kind, search_term.as_deref(), clear_history)
                    .await
            }
            Message::CheckAuth {} => self.check_auth().await,
            Message::Login {} => self.login().await,
            Message::Logout {} => self.logout().await,
        }
    }

    /// The credential to attach, enforcing `require_auth`.
    async fn credential(&self) -> Result<Option<SessionToken>> {
        let session = self.ctx.session().await?;
        if session.is_none() && self.ctx.config.require_auth {
            return Err(RelayError::AuthenticationRequired(
                "log in before searching".to_string(),
            ));
        }
        Ok(session)
    }

    async fn search(
        &self,
        kind: SearchKind,
        video_id: Option<&str>,
        term: &str,
    ) -> Result<ResponseEnvelope> {
        let term = term.trim();
        if kind != SearchKind::Toc && term.is_empty() {
            return Err(RelayError::InvalidRequest("search term is required".to_string()));
        }

        let video_id = self
            .ctx
            .resolver
            .resolve(video_id)
            .await?
            .ok_or(RelayError::NoVideoDetected)?;
        let credential = self.credential().await?;

        let fingerprint = RequestFingerprint::new(kind, &video_id, term);
        if let Some(data) = self.ctx.cache.get(&fingerprint) {
            return Ok(ResponseEnvelope::success(data));
        }

        info!("Searching {} for '{}' in video {}", kind, term, video_id);
        let envelope = self
            .ctx
            .gateway
            .call(kind, &video_id, term, credential.as_ref())
            .await;

        if let (true, Some(data)) = (envelope.is_success(), envelope.data.as_ref()) {
            self.ctx.cache.set(&fingerprint, data.clone());
            let entry = HistoryEntry {
                video_id,
                kind,
                search_term: term.to_string(),
                result_count: result_count(data),
                searched_at: unix_now(),
            };
            if let Err(e) = self.ctx.history.store(entry).await {
                warn!("Could not record search history: {}", e);
            }
        }

        Ok(envelope)
    }

    async fn search_history(&self) -> Result<ResponseEnvelope> {
        let entries = self.ctx.history.entries().await?;
        if entries.is_empty() {
            debug!("No search history found");
            return Ok(ResponseEnvelope::empty(json!([])));
        }
        Ok(ResponseEnvelope::success(serde_json::to_value(entries)?))
    }

    async fn clear_cache(
        &self,
        video_id: Option<&str>,
        kind: Option<SearchKind>,
        term: Option<&str>,
        clear_history: bool,
    ) -> Result<ResponseEnvelope> {
        // A blank id names no video; it must not fall back to the current one.
        let video_id = match video_id.filter(|v| !v.trim().is_empty()) {
            Some(explicit) => self.ctx.resolver.resolve(Some(explicit)).await?,
            None => None,
        };

        let message = match (video_id, kind, term) {
            (Some(video_id), Some(kind), Some(term)) => {
                let fingerprint = RequestFingerprint::new(kind, &video_id, term);
                self.ctx.cache.clear(&fingerprint);
                format!("Cleared cached {} results", fingerprint)
            }
            _ => {
                self.ctx.cache.clear_all();
                "Cache cleared".to_string()
            }
        };

        if clear_history {
            self.ctx.history.clear().await?;
        }
        info!("{}", message);
        Ok(ResponseEnvelope::done(message))
    }

    async fn check_auth(&self) -> Result<ResponseEnvelope> {
        let session = self
            .ctx
            .session()
            .await?
            .ok_or_else(|| RelayError::AuthenticationRequired("not logged in".to_string()))?;

        let status = self.ctx.gateway.validate_token(&session.token).await?;
        if !status.valid {
            self.ctx.clear_session().await?;
            return Err(RelayError::AuthenticationRequired(
                "session is no longer valid".to_string(),
            ));
        }

        if let Some(user) = &status.user {
            self.ctx.store.set(USER_PROFILE, user.clone()).await?;
        }
        Ok(ResponseEnvelope::success(json!({
            "valid": true,
            "user": status.user,
            "expiresAt": session.expires_at,
        })))
    }

    async fn login(&self) -> Result<ResponseEnvelope> {
        let session = self
            .ctx
            .gateway
            .request_token(&self.ctx.config.extension_id)
            .await?;
        self.ctx.save_session(&session).await?;
        info!("Logged in, session valid until {}", session.expires_at);
        Ok(ResponseEnvelope::success_with_message(
            json!({ "expiresAt": session.expires_at }),
            "Logged in successfully",
        ))
    }

    async fn logout(&self) -> Result<ResponseEnvelope> {
        self.ctx.clear_session().await?;
        info!("Logged out");
        Ok(ResponseEnvelope::done("Logged out"))
    }
}
