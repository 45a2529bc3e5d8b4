//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cursor-based pagination over JSON and DuckDB collections
#[derive(Parser, Debug)]
#[command(name = "cursor-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Paginator configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single page
    Page {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Cursor from a previous page's nextCursor
        #[arg(long, conflicts_with = "previous")]
        next: Option<String>,

        /// Cursor from a previous page's previousCursor
        #[arg(long)]
        previous: Option<String>,
    },

    /// Walk every page forward from the start
    Walk {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        query: QueryArgs,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Show what a cursor string carries
    Decode {
        /// Cursor string
        cursor: String,
    },
}

/// Where documents come from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// JSON array or JSON lines file
    #[arg(short, long, conflicts_with = "duckdb", required_unless_present = "duckdb")]
    pub data: Option<PathBuf>,

    /// DuckDB database file
    #[arg(long, requires = "table")]
    pub duckdb: Option<PathBuf>,

    /// Table to page through (DuckDB only)
    #[arg(long)]
    pub table: Option<String>,
}

/// How to sort, filter and size pages
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Field to paginate on
    #[arg(long)]
    pub field: String,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Page size (defaults to the configured default_limit)
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Filter document, e.g. '{"status": {"$in": ["open", "new"]}}'
    #[arg(long)]
    pub filter: Option<String>,

    /// Tie-breaker field (overrides the configured id_field)
    #[arg(long)]
    pub id_field: Option<String>,

    /// Count all matching documents
    #[arg(long)]
    pub count: bool,

    /// Collation locale, e.g. "en"
    #[arg(long)]
    pub collation: Option<String>,

    /// Collation strength (1-5; 1 and 2 ignore case)
    #[arg(long, requires = "collation")]
    pub strength: Option<u8>,

    /// Compare digit runs numerically
    #[arg(long, requires = "collation")]
    pub numeric: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
