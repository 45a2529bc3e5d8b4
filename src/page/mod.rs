//! Page module
//!
//! The result side of a page request.
//!
//! # Overview
//!
//! [`PageAssembler`] turns the `limit + 1` documents fetched for a
//! [`QueryPlan`](crate::query::QueryPlan) into a [`Page`]:
//!
//! | request        | `has_previous`        | `has_next`            |
//! |----------------|-----------------------|-----------------------|
//! | first page     | `false`               | extra doc fetched     |
//! | next cursor    | `true`                | extra doc fetched     |
//! | previous cursor| extra doc fetched     | `true`                |
//!
//! Cursors are built from the last document (next) and the first document
//! (previous) of the page, only when the matching flag is set.

mod assembler;
mod types;

pub use assembler::PageAssembler;
pub use types::{Page, PageInfo};
