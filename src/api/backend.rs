use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::models::envelope::ResponseEnvelope;
use crate::models::fingerprint::SearchKind;
use crate::models::results;
use crate::models::session::{AuthStatus, SessionToken};

/// HTTP client for the search backend.
///
/// Every call is bounded by a timeout and never retried; failures come back
/// as `error` envelopes rather than `Err`.
pub struct BackendGateway {
    client: Client,
    base_url: String,
    transcript_timeout: Duration,
    detection_timeout: Duration,
    validate_responses: bool,
}

#[derive(Deserialize)]
struct IssuedToken {
    token: String,
    expires_at: f64,
}

impl BackendGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vidify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            transcript_timeout: config.transcript_timeout(),
            detection_timeout: config.detection_timeout(),
            validate_responses: config.validate_responses,
        })
    }

    pub fn timeout_for(&self, kind: SearchKind) -> Duration {
        if kind.is_detection() {
            self.detection_timeout
        } else {
            self.transcript_timeout
        }
    }

    fn endpoint(&self, kind: SearchKind) -> String {
        let path = match kind {
            SearchKind::Transcript => "transcript_search",
            SearchKind::Object | SearchKind::Toc => "object_search",
        };
        format!("{}/{}", self.base_url, path)
    }

    fn with_credential(request: RequestBuilder, credential: Option<&SessionToken>) -> RequestBuilder {
        match credential {
            Some(session) => request.bearer_auth(&session.token),
            None => request,
        }
    }

    /// Run one search against the backend and normalize whatever comes back.
    pub async fn call(
        &self,
        kind: SearchKind,
        video_id: &str,
        term: &str,
        credential: Option<&SessionToken>,
    ) -> ResponseEnvelope {
        match self.fetch(kind, video_id, term, credential).await {
            Ok((status, body)) => normalize_response(kind, status, &body, self.validate_responses),
            Err(e) => {
                warn!("{} search for {} failed: {}", kind, video_id, e);
                e.into()
            }
        }
    }

    async fn fetch(
        &self,
        kind: SearchKind,
        video_id: &str,
        term: &str,
        credential: Option<&SessionToken>,
    ) -> Result<(StatusCode, String)> {
        let url = self.endpoint(kind);
        let timeout = self.timeout_for(kind);

        let mut query = vec![("yt_url", video_id)];
        if kind != SearchKind::Toc {
            query.push(("keyword", term));
        }

        debug!("Sending {} request to {}", kind, url);
        let request = self.client.get(&url).query(&query).timeout(timeout);
        let response = Self::with_credential(request, credential)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        debug!("{} responded {} with {} bytes", url, status, body.len());
        Ok((status, body))
    }

    /// Ask the backend whether a bearer token is still good.
    pub async fn validate_token(&self, token: &str) -> Result<AuthStatus> {
        let url = format!("{}/auth/validate", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .timeout(self.transcript_timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, self.transcript_timeout))?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(AuthStatus {
                valid: false,
                user: None,
            });
        }
        if !status.is_success() {
            return Err(RelayError::Network(error_message(status, &body)));
        }
        serde_json::from_str(&body).map_err(|_| malformed_body(&body))
    }

    /// Obtain a fresh session token for this extension id.
    pub async fn request_token(&self, extension_id: &str) -> Result<SessionToken> {
        let url = format!("{}/auth/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Extension-Id", extension_id)
            .timeout(self.transcript_timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, self.transcript_timeout))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RelayError::AuthenticationRequired(error_message(status, &body)));
        }
        let issued: IssuedToken = serde_json::from_str(&body).map_err(|_| malformed_body(&body))?;
        Ok(SessionToken {
            token: issued.token,
            expires_at: issued.expires_at.max(0.0) as u64,
        })
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout(timeout.as_millis() as u64)
    } else {
        RelayError::Network(err.to_string())
    }
}

fn malformed_body(body: &str) -> RelayError {
    RelayError::MalformedResponse(format!("invalid JSON from backend: {}", body.trim()))
}

/// Message for a non-2xx reply: the body's own `message` or `error` when it has one.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error"]
                .iter()
                .find_map(|k| json.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

/// Turn a raw backend reply into an envelope.
pub fn normalize_response(
    kind: SearchKind,
    status: StatusCode,
    body: &str,
    validate: bool,
) -> ResponseEnvelope {
    if !status.is_success() {
        return ResponseEnvelope::error(error_message(status, body));
    }

    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => return malformed_body(body).into(),
    };

    if validate {
        if let Err(e) = results::validate(kind, &json) {
            return e.into();
        }
    }

    if results::result_count(&json) == 0 {
        ResponseEnvelope::empty(json)
    } else {
        ResponseEnvelope::success(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::envelope::Status;
    use serde_json::json;

    #[test]
    fn test_error_body_message_is_surfaced() {
        for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
            let envelope =
                normalize_response(SearchKind::Transcript, status, r#"{"message":"boom"}"#, true);
            assert_eq!(envelope, ResponseEnvelope::error("boom"));
        }
    }

    #[test]
    fn test_error_without_message_names_status() {
        let envelope = normalize_response(SearchKind::Object, StatusCode::BAD_GATEWAY, "<html>", true);
        assert_eq!(envelope.status, Status::Error);
        assert!(envelope.message.unwrap().contains("502"));
    }

    #[test]
    fn test_non_json_success_quotes_body() {
        let envelope = normalize_response(SearchKind::Transcript, StatusCode::OK, "not json", true);
        assert_eq!(envelope.status, Status::Error);
        assert!(envelope.message.unwrap().contains("not json"));
    }

    #[test]
    fn test_schema_mismatch_only_when_validating() {
        let body = r#"{"results":[{"text":"hello"}]}"#;
        let strict = normalize_response(SearchKind::Transcript, StatusCode::OK, body, true);
        assert_eq!(strict.status, Status::Error);
        assert!(strict.message.unwrap().starts_with("Malformed response"));

        let lax = normalize_response(SearchKind::Transcript, StatusCode::OK, body, false);
        assert_eq!(lax.status, Status::Success);
    }

    #[test]
    fn test_success_and_empty() {
        let hit = r#"{"results":[{"text":"hello","timestamp":"0:05"}]}"#;
        let envelope = normalize_response(SearchKind::Transcript, StatusCode::OK, hit, true);
        assert_eq!(
            envelope,
            ResponseEnvelope::success(json!({"results":[{"text":"hello","timestamp":"0:05"}]}))
        );

        let none = normalize_response(SearchKind::Transcript, StatusCode::OK, r#"{"results":[]}"#, true);
        assert_eq!(none.status, Status::Empty);
    }

    #[test]
    fn test_long_non_json_body_is_quoted_whole() {
        let long = format!("{}<end>", "x".repeat(600));
        let envelope = normalize_response(SearchKind::Object, StatusCode::OK, &long, true);
        assert!(envelope.message.unwrap().ends_with("<end>"));
    }

    #[test]
    fn test_each_kind_gets_its_own_timeout() {
        let config = Config {
            transcript_timeout_ms: 1_500,
            detection_timeout_ms: 9_000,
            ..Config::default()
        };
        let gateway = BackendGateway::new(&config).unwrap();

        assert_eq!(gateway.timeout_for(SearchKind::Transcript), Duration::from_millis(1_500));
        assert_eq!(gateway.timeout_for(SearchKind::Object), Duration::from_millis(9_000));
        assert_eq!(gateway.timeout_for(SearchKind::Toc), Duration::from_millis(9_000));
    }
}
