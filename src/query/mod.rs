//! Query module
//!
//! Page requests, filter expressions and the planner that turns one into
//! the other.
//!
//! # Overview
//!
//! - [`FindParams`]: what the caller wants (field, direction, limit, cursor)
//! - [`Filter`]: storage-neutral filter expression, parseable from JSON
//! - [`QueryPlanner`]: validates a request and builds the [`QueryRequest`]
//!   the storage collaborator runs, fetching `limit + 1` documents so the
//!   page assembler can tell whether more exist

mod filter;
mod parse;
mod planner;
mod types;

pub use filter::{Filter, Operator};
pub use planner::{keyset_bound, QueryPlanner};
pub use types::{FetchMode, FindParams, QueryPlan, QueryRequest, SortField, SortSpec};
