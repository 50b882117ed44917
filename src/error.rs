use thiserror::Error;

/// Everything that can go wrong between a UI request and the backend.
///
/// The message router is the only place these are turned into envelopes;
/// everything below it propagates with `?`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("No video detected or provided")]
    NoVideoDetected,

    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
