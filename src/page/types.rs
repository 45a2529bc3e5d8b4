//! Page result types

use serde::{Deserialize, Serialize};

/// Navigation state of a page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Cursor for the page after this one, present when `has_next` and the
    /// page is non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,

    /// Cursor for the page before this one, present when `has_previous` and
    /// the page is non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<String>,

    /// Whether documents exist after this page
    pub has_next: bool,

    /// Whether documents exist before this page
    pub has_previous: bool,

    /// Documents matching the caller's filter, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// One page of documents in sort order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<D> {
    /// Documents, at most `limit` of them
    pub documents: Vec<D>,

    /// Cursors and flags
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<D> Page<D> {
    /// Number of documents on the page
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the page has no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Cursor for the next page
    pub fn next_cursor(&self) -> Option<&str> {
        self.info.next_cursor.as_deref()
    }

    /// Cursor for the previous page
    pub fn previous_cursor(&self) -> Option<&str> {
        self.info.previous_cursor.as_deref()
    }

    /// Transform the documents, keeping navigation state
    pub fn map<T>(self, f: impl FnMut(D) -> T) -> Page<T> {
        Page {
            documents: self.documents.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}
