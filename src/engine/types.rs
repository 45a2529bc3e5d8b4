//! Engine types

use serde::Serialize;

/// Statistics from walking a result set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Total documents read
    pub documents_read: usize,
    /// Total matching documents, when counted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl WalkStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page
    pub fn add_page(&mut self, documents: usize, total: Option<u64>) {
        self.pages_fetched += 1;
        self.documents_read += documents;
        if total.is_some() {
            self.total = total;
        }
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
