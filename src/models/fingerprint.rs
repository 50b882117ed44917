use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// Which backend search a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Transcript,
    Object,
    /// Every detected object with its occurrences; no keyword.
    Toc,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Transcript => "transcript",
            SearchKind::Object => "object",
            SearchKind::Toc => "toc",
        }
    }

    /// Object detection and its table of contents are the slow, detection-class calls.
    pub fn is_detection(&self) -> bool {
        !matches!(self, SearchKind::Transcript)
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transcript" => Ok(SearchKind::Transcript),
            "object" | "objects" => Ok(SearchKind::Object),
            "toc" => Ok(SearchKind::Toc),
            other => Err(RelayError::InvalidRequest(format!("unknown search kind '{}'", other))),
        }
    }
}

/// Trim, collapse whitespace runs and lowercase a search term.
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Cache key for a search: `kind:videoId:normalizedTerm`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    pub fn new(kind: SearchKind, video_id: &str, term: &str) -> Self {
        Self(format!("{}:{}:{}", kind, video_id, normalize_term(term)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
