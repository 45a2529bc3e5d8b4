//! Query types
//!
//! [`FindParams`] is what a caller asks for; [`QueryRequest`] is what the
//! storage collaborator is asked to run; [`QueryPlan`] ties the two together
//! so the page assembler knows how the fetch was made.

use super::filter::Filter;
use crate::cursor::PaginationKey;
use crate::types::{Collation, SortDirection};
use serde::{Deserialize, Serialize};

// ============================================================================
// Find Parameters
// ============================================================================

/// Parameters for a single page request
#[derive(Debug, Clone, PartialEq)]
pub struct FindParams {
    /// Caller's filter
    pub filter: Filter,
    /// Field to paginate on
    pub paginated_field: String,
    /// Sort direction of the paginated field
    pub direction: SortDirection,
    /// Maximum number of documents per page (must be positive)
    pub limit: i64,
    /// Cursor from a previous page's `next_cursor`
    pub next: Option<String>,
    /// Cursor from a previous page's `previous_cursor`
    pub previous: Option<String>,
    /// Collation passed through to storage
    pub collation: Option<Collation>,
    /// Whether to count all documents matching the filter
    pub count_total: bool,
    /// Fields to return (all fields if `None`)
    pub projection: Option<Vec<String>>,
    /// Index hint passed through to storage
    pub hint: Option<String>,
}

impl FindParams {
    /// Create parameters for the first page of `paginated_field`, ascending
    pub fn new(paginated_field: impl Into<String>, limit: i64) -> Self {
        Self {
            filter: Filter::All,
            paginated_field: paginated_field.into(),
            direction: SortDirection::Ascending,
            limit,
            next: None,
            previous: None,
            collation: None,
            count_total: false,
            projection: None,
            hint: None,
        }
    }

    /// Set the filter
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the sort direction
    #[must_use]
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sort descending
    #[must_use]
    pub fn descending(self) -> Self {
        self.with_direction(SortDirection::Descending)
    }

    /// Set the page size
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Request the page after `cursor`, clearing any previous cursor
    #[must_use]
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.next = Some(cursor.into());
        self.previous = None;
        self
    }

    /// Request the page before `cursor`, clearing any next cursor
    #[must_use]
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.previous = Some(cursor.into());
        self.next = None;
        self
    }

    /// Set the collation
    #[must_use]
    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = Some(collation);
        self
    }

    /// Request a total count
    #[must_use]
    pub fn with_count_total(mut self, count_total: bool) -> Self {
        self.count_total = count_total;
        self
    }

    /// Restrict the returned fields
    #[must_use]
    pub fn with_projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set an index hint
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Sort Specification
// ============================================================================

/// A single sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Field name
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

impl SortField {
    /// Create a sort key
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Ordered list of sort keys, most significant first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec(pub Vec<SortField>);

impl SortSpec {
    /// Sort keys in significance order
    pub fn fields(&self) -> &[SortField] {
        &self.0
    }

    /// Same keys with every direction flipped
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|s| SortField::new(s.field.clone(), s.direction.reversed()))
                .collect(),
        )
    }
}

// ============================================================================
// Storage Request
// ============================================================================

/// A query for the storage collaborator to execute
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Effective filter (caller's filter plus any keyset bound)
    pub filter: Filter,
    /// Effective sort order
    pub sort: SortSpec,
    /// Maximum documents to return
    pub limit: usize,
    /// Collation, untouched
    pub collation: Option<Collation>,
    /// Fields to return
    pub projection: Option<Vec<String>>,
    /// Index hint, untouched
    pub hint: Option<String>,
}

// ============================================================================
// Query Plan
// ============================================================================

/// How the storage fetch is positioned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMode {
    /// No cursor: the first page
    First,
    /// Strictly after a key, in sort order
    After(PaginationKey),
    /// Strictly before a key, fetched in reversed sort order
    Before(PaginationKey),
}

impl FetchMode {
    /// Whether documents come back in reversed order
    pub fn is_reversed(&self) -> bool {
        matches!(self, FetchMode::Before(_))
    }
}

/// Everything needed to run a page request and assemble its result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Query for storage
    pub request: QueryRequest,
    /// Caller's original filter, present when a total count was requested
    pub count_filter: Option<Filter>,
    /// Fetch positioning
    pub mode: FetchMode,
    /// Page size as requested
    pub limit: usize,
    /// Paginated field
    pub paginated_field: String,
    /// Tie-breaker id field
    pub id_field: String,
}
