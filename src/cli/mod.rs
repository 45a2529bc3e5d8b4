//! CLI module
//!
//! Command-line interface for paging through document collections.
//!
//! # Commands
//!
//! - `page` - Fetch one page, optionally after or before a cursor
//! - `walk` - Follow next cursors until the last page
//! - `decode` - Show the direction, field and key inside a cursor

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, QueryArgs, SourceArgs};
pub use runner::Runner;
