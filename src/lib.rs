// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # cursor-pager
//!
//! Stable, bidirectional, cursor-based pagination over sorted document
//! collections.
//!
//! Instead of offset/limit, each page hands back opaque cursors that
//! encode the position of its boundary documents: the paginated-field value
//! plus the document id as a tie-breaker. Re-submitting a cursor continues
//! exactly where the page ended, even while other documents are being
//! inserted.
//!
//! ## Features
//!
//! - **Keyset Pagination**: `(field, id)` bounds, `limit + 1` look-ahead
//! - **Both Directions**: next and previous cursors on every page
//! - **Tamper-Evident Cursors**: versioned binary format with a checksum
//! - **Total Counts**: optional, run concurrently with the page query
//! - **Collation**: passed through to storage for locale-aware ordering
//! - **Storage Adapters**: in-memory and DuckDB
//!
//! ## Quick Start
//!
//! ```rust
//! use cursor_pager::{FindParams, MemoryStore, Paginator};
//! use serde_json::{json, Value};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cursor_pager::Result<()> {
//! let store = MemoryStore::with_documents(vec![
//!     json!({"_id": "a", "rank": 1}),
//!     json!({"_id": "b", "rank": 1}),
//!     json!({"_id": "c", "rank": 2}),
//! ]);
//! let paginator = Paginator::new(store);
//! let cancel = CancellationToken::new();
//!
//! let first = paginator
//!     .find::<Value>(FindParams::new("rank", 2), &cancel)
//!     .await?;
//! assert!(first.info.has_next);
//!
//! let cursor = first.next_cursor().unwrap_or_default();
//! let second = paginator
//!     .find::<Value>(FindParams::new("rank", 2).after(cursor), &cancel)
//!     .await?;
//! assert_eq!(second.documents, vec![json!({"_id": "c", "rank": 2})]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Paginator                              │
//! │      find(params) → Page     walk(params) → Stream<Page>        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────────────┬──────────────────┐
//! │ QueryPlanner │           Storage             │  PageAssembler   │
//! ├──────────────┼───────────────────────────────┼──────────────────┤
//! │ limit check  │ query(filter, sort, limit+1)  │ trim look-ahead  │
//! │ decode cursor│ count(filter)                 │ restore order    │
//! │ keyset bound │ MemoryStore / DuckDbStore     │ flags + cursors  │
//! └──────────────┴───────────────────────────────┴──────────────────┘
//!                                │
//!                          CursorCodec
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Comparable values and the document trait
pub mod value;

/// Opaque cursor encoding
pub mod cursor;

/// Page requests, filters and query planning
pub mod query;

/// Page results and assembly
pub mod page;

/// Storage collaborators
pub mod storage;

/// Pagination engine
pub mod engine;

/// Paginator configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PaginatorConfig;
pub use cursor::{CursorCodec, PaginationKey};
pub use engine::{Paginator, WalkStats};
pub use page::{Page, PageInfo};
pub use query::{Filter, FindParams, Operator};
pub use storage::{DuckDbStore, MemoryStore, Storage, StorageError};
pub use value::{Document, Scalar};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
