//! Storage module
//!
//! The collaborator the paginator reads from.
//!
//! # Overview
//!
//! [`Storage`] is the seam: one query (filter, sort, limit, collation) and
//! one count per page request, both taking the caller's cancellation token.
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: any [`Document`](crate::Document) type, held in a `Vec`
//! - [`DuckDbStore`]: rows of a DuckDB table as JSON documents

mod duckdb_store;
mod memory;
mod types;

pub use duckdb_store::DuckDbStore;
pub use memory::MemoryStore;
pub use types::{Storage, StorageError};
