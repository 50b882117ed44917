use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Bearer credential issued by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    /// Unix seconds
    pub expires_at: u64,
}

impl SessionToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_now()
    }
}

/// Backend reply to `/auth/validate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthStatus {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<Value>,
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let live = SessionToken {
            token: "abc".to_string(),
            expires_at: unix_now() + 3600,
        };
        let stale = SessionToken {
            token: "abc".to_string(),
            expires_at: unix_now().saturating_sub(1),
        };
        assert!(!live.is_expired());
        assert!(stale.is_expired());
    }
}
