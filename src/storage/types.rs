//! Storage collaborator contract

use crate::query::{Filter, QueryRequest};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failure reported by a storage collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    /// The sort specification names a field the store cannot sort on
    #[error("Cannot sort on '{field}': {message}")]
    InvalidSort { field: String, message: String },

    /// The filter uses something the store cannot express
    #[error("Unsupported filter: {message}")]
    UnsupportedFilter { message: String },

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Any other backend failure
    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl StorageError {
    /// Create an invalid sort error
    pub fn invalid_sort(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSort {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported filter error
    pub fn unsupported_filter(message: impl Into<String>) -> Self {
        Self::UnsupportedFilter {
            message: message.into(),
        }
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// A document store the paginator can query.
///
/// Implementations must return documents matching `request.filter`, ordered
/// by `request.sort` (honouring `request.collation` where they can), and at
/// most `request.limit` of them. The cancellation token is the caller's own;
/// implementations should check it and give up with
/// [`StorageError::Cancelled`].
#[async_trait]
pub trait Storage<D: Send>: Send + Sync {
    /// Run a query
    async fn query(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<D>, StorageError>;

    /// Count documents matching a filter.
    ///
    /// No collation is passed, so string comparisons in `filter` are
    /// binary. Under a case-insensitive collation the total can therefore
    /// differ from the number of documents the pages return.
    async fn count(&self, filter: &Filter, cancel: &CancellationToken)
        -> Result<u64, StorageError>;
}
