//! Value module
//!
//! Scalar values and the document access trait used for sorting.

mod document;
mod scalar;

pub use document::Document;
pub use scalar::Scalar;
