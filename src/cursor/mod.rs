//! Cursor module
//!
//! Opaque cursor tokens for cursor-based pagination.
//!
//! # Overview
//!
//! A cursor records the position of a boundary document as a
//! [`PaginationKey`]: the paginated-field value plus the document id that
//! breaks ties between equal values. The [`CursorCodec`] turns keys into
//! URL-safe strings and back, failing closed on anything it did not produce.
//!
//! ```
//! use cursor_pager::cursor::{CursorCodec, CursorDirection, CursorToken, PaginationKey};
//!
//! let codec = CursorCodec::default();
//! let token = CursorToken::new(CursorDirection::Next, "rank", PaginationKey::new(1, "b"));
//!
//! let encoded = codec.encode(&token);
//! let key = codec.decode_for(&encoded, "rank", CursorDirection::Next).unwrap();
//! assert_eq!(key, PaginationKey::new(1, "b"));
//! ```

mod codec;
mod types;

pub use codec::{CursorCodec, CURSOR_VERSION, DEFAULT_MAX_CURSOR_BYTES};
pub use types::{CursorDirection, CursorToken, PaginationKey};
