//! Document access for pagination
//!
//! The engine never inspects documents beyond the two fields it sorts on.
//! Any type that can hand out a [`Scalar`] for a field name can be paginated.

use super::scalar::Scalar;
use crate::types::JsonValue;

/// A document that can be positioned in sort order
///
/// # Example
///
/// ```
/// use cursor_pager::{Document, Scalar};
///
/// struct Item {
///     id: String,
///     rank: i64,
/// }
///
/// impl Document for Item {
///     fn field(&self, name: &str) -> Option<Scalar> {
///         match name {
///             "_id" => Some(Scalar::from(self.id.as_str())),
///             "rank" => Some(Scalar::Int(self.rank)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Document: Send + Sync {
    /// Read a field value, or `None` if the document has no such field
    fn field(&self, name: &str) -> Option<Scalar>;
}

impl Document for JsonValue {
    /// Fields are looked up by dot path (e.g., `meta.createdAt`).
    fn field(&self, name: &str) -> Option<Scalar> {
        let mut current = self;
        for part in name.split('.') {
            match current {
                JsonValue::Object(map) => {
                    current = map.get(part)?;
                }
                _ => return None,
            }
        }

        Scalar::from_json(current).ok()
    }
}

impl<D: Document> Document for Box<D> {
    fn field(&self, name: &str) -> Option<Scalar> {
        (**self).field(name)
    }
}

impl<D: Document> Document for std::sync::Arc<D> {
    fn field(&self, name: &str) -> Option<Scalar> {
        (**self).field(name)
    }
}
