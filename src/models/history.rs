use serde::{Deserialize, Serialize};

use super::fingerprint::SearchKind;

/// One completed search, as kept in the search history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub video_id: String,
    pub kind: SearchKind,
    pub search_term: String,
    pub result_count: usize,
    /// Unix seconds
    pub searched_at: u64,
}

impl HistoryEntry {
    pub fn is_valid(&self) -> bool {
        !self.video_id.trim().is_empty()
            && (self.kind == SearchKind::Toc || !self.search_term.trim().is_empty())
    }
}
