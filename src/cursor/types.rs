//! Cursor types
//!
//! Value objects describing a position in sort order.

use crate::error::{Error, Result};
use crate::value::{Document, Scalar};
use std::fmt;

/// Position of a document in sort order.
///
/// The paginated-field value alone is not unique, so the document id is
/// carried as a tie-breaker. Together they totally order the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationKey {
    field_value: Scalar,
    id: Scalar,
}

impl PaginationKey {
    /// Create a key from a field value and a document id
    pub fn new(field_value: impl Into<Scalar>, id: impl Into<Scalar>) -> Self {
        Self {
            field_value: field_value.into(),
            id: id.into(),
        }
    }

    /// Build the key of a document.
    ///
    /// A missing paginated field reads as null. A missing id cannot be
    /// positioned and is rejected.
    pub fn from_document<D: Document + ?Sized>(
        doc: &D,
        paginated_field: &str,
        id_field: &str,
    ) -> Result<Self> {
        let id = doc.field(id_field).ok_or_else(|| {
            Error::invalid_sort_field(id_field, "document has no value for the tie-breaker id")
        })?;
        let field_value = if paginated_field == id_field {
            id.clone()
        } else {
            doc.field(paginated_field).unwrap_or(Scalar::Null)
        };

        Ok(Self { field_value, id })
    }

    /// The paginated-field value
    pub fn field_value(&self) -> &Scalar {
        &self.field_value
    }

    /// The tie-breaker id
    pub fn id(&self) -> &Scalar {
        &self.id
    }

    /// Split into `(field_value, id)`
    pub fn into_parts(self) -> (Scalar, Scalar) {
        (self.field_value, self.id)
    }
}

impl fmt::Display for PaginationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.field_value, self.id)
    }
}

/// Which page request a cursor was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorDirection {
    /// Fetch the page after the encoded position
    Next,
    /// Fetch the page before the encoded position
    Previous,
}

impl CursorDirection {
    /// Wire marker for this direction
    pub(crate) fn marker(self) -> u8 {
        match self {
            Self::Next => 0x01,
            Self::Previous => 0x02,
        }
    }

    /// Parse a wire marker
    pub(crate) fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            0x01 => Some(Self::Next),
            0x02 => Some(Self::Previous),
            _ => None,
        }
    }
}

impl fmt::Display for CursorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Previous => write!(f, "previous"),
        }
    }
}

/// Everything a cursor string carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorToken {
    /// Page request the cursor was issued for
    pub direction: CursorDirection,
    /// Paginated field the key was taken from
    pub field: String,
    /// Position in sort order
    pub key: PaginationKey,
}

impl CursorToken {
    /// Create a new cursor token
    pub fn new(direction: CursorDirection, field: impl Into<String>, key: PaginationKey) -> Self {
        Self {
            direction,
            field: field.into(),
            key,
        }
    }
}
