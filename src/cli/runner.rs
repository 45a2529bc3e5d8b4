//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, QueryArgs, SourceArgs};
use crate::config::PaginatorConfig;
use crate::cursor::CursorCodec;
use crate::engine::{Paginator, WalkStats};
use crate::error::{Error, Result};
use crate::query::{Filter, FindParams};
use crate::storage::{DuckDbStore, MemoryStore, Storage};
use crate::types::{Collation, JsonValue, SortDirection};
use futures::TryStreamExt;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Opened document source
enum Source {
    Memory(MemoryStore<JsonValue>),
    DuckDb(DuckDbStore),
}

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts in-flight storage calls when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Page {
                source,
                query,
                next,
                previous,
            } => {
                self.page(source, query, next.as_deref(), previous.as_deref())
                    .await
            }
            Commands::Walk {
                source,
                query,
                max_pages,
            } => self.walk(source, query, *max_pages).await,
            Commands::Decode { cursor } => self.decode(cursor),
        }
    }

    /// Load the paginator configuration, applying command-line overrides
    fn load_config(&self, query: Option<&QueryArgs>) -> Result<PaginatorConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PaginatorConfig::from_file(path)?,
            None => PaginatorConfig::default(),
        };

        if let Some(id_field) = query.and_then(|q| q.id_field.as_deref()) {
            config = config.with_id_field(id_field);
            config.validate()?;
        }

        Ok(config)
    }

    /// Build first-page parameters from the query arguments
    fn build_params(&self, config: &PaginatorConfig, query: &QueryArgs) -> Result<FindParams> {
        let limit = query
            .limit
            .unwrap_or_else(|| i64::from(config.default_limit));

        let mut params = FindParams::new(&query.field, limit)
            .with_direction(SortDirection::from_ascending(!query.desc))
            .with_count_total(query.count || config.count_total);

        if let Some(filter) = &query.filter {
            params = params.with_filter(Filter::from_json_str(filter)?);
        }

        if let Some(locale) = &query.collation {
            let mut collation = Collation::new(locale).with_numeric_ordering(query.numeric);
            if let Some(strength) = query.strength {
                collation = collation.with_strength(strength);
            }
            params = params.with_collation(collation);
        }

        Ok(params)
    }

    /// Open the store named by the source arguments
    fn open_source(&self, source: &SourceArgs) -> Result<Source> {
        if let Some(path) = &source.duckdb {
            let table = source
                .table
                .as_deref()
                .ok_or_else(|| Error::config("--table is required with --duckdb"))?;
            tracing::debug!("Opening DuckDB table '{}' in {}", table, path.display());
            return Ok(Source::DuckDb(DuckDbStore::open(path, table)?));
        }

        let path = source
            .data
            .as_ref()
            .ok_or_else(|| Error::config("No data source specified (use --data or --duckdb)"))?;
        let documents = load_documents(path)?;
        tracing::debug!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(Source::Memory(MemoryStore::with_documents(documents)))
    }

    /// Fetch one page
    async fn page(
        &self,
        source: &SourceArgs,
        query: &QueryArgs,
        next: Option<&str>,
        previous: Option<&str>,
    ) -> Result<()> {
        let config = self.load_config(Some(query))?;
        let mut params = self.build_params(&config, query)?;
        params.next = next.map(String::from);
        params.previous = previous.map(String::from);

        match self.open_source(source)? {
            Source::Memory(store) => {
                self.fetch_page(Paginator::with_config(store, config), params)
                    .await
            }
            Source::DuckDb(store) => {
                self.fetch_page(Paginator::with_config(store, config), params)
                    .await
            }
        }
    }

    async fn fetch_page<S: Storage<JsonValue>>(
        &self,
        paginator: Paginator<S>,
        params: FindParams,
    ) -> Result<()> {
        let page = paginator.find::<JsonValue>(params, &self.cancel).await?;
        tracing::info!(
            "Fetched {} documents (has_next: {}, has_previous: {})",
            page.len(),
            page.info.has_next,
            page.info.has_previous
        );
        self.emit(&page)
    }

    /// Walk every page forward
    async fn walk(
        &self,
        source: &SourceArgs,
        query: &QueryArgs,
        max_pages: Option<usize>,
    ) -> Result<()> {
        let config = self.load_config(Some(query))?;
        let params = self.build_params(&config, query)?;

        match self.open_source(source)? {
            Source::Memory(store) => {
                self.walk_pages(Paginator::with_config(store, config), params, max_pages)
                    .await
            }
            Source::DuckDb(store) => {
                self.walk_pages(Paginator::with_config(store, config), params, max_pages)
                    .await
            }
        }
    }

    async fn walk_pages<S: Storage<JsonValue>>(
        &self,
        paginator: Paginator<S>,
        params: FindParams,
        max_pages: Option<usize>,
    ) -> Result<()> {
        let start = Instant::now();
        let mut stats = WalkStats::new();

        let mut pages = std::pin::pin!(paginator.walk::<JsonValue>(params, &self.cancel));
        while let Some(page) = pages.try_next().await? {
            stats.add_page(page.len(), page.info.total);
            self.emit(&page)?;

            if max_pages.is_some_and(|max| stats.pages_fetched >= max) {
                tracing::info!("Reached max pages ({})", stats.pages_fetched);
                break;
            }
        }

        stats.set_duration(start.elapsed().as_millis() as u64);
        tracing::info!(
            "Walk complete: {} pages, {} documents in {}ms",
            stats.pages_fetched,
            stats.documents_read,
            stats.duration_ms
        );

        self.emit(&json!({ "type": "STATS", "stats": stats }))
    }

    /// Print what a cursor carries
    fn decode(&self, cursor: &str) -> Result<()> {
        let config = self.load_config(None)?;
        let token = CursorCodec::new(config.max_cursor_bytes).decode(cursor)?;

        self.emit(&json!({
            "direction": token.direction.to_string(),
            "field": token.field,
            "value": token.key.field_value().to_json(),
            "id": token.key.id().to_json(),
        }))
    }

    /// Write one message to stdout in the selected format
    fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{line}");
        Ok(())
    }
}

/// Load documents from a JSON array or JSON lines file
fn load_documents(path: &Path) -> Result<Vec<JsonValue>> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&content)?);
    }

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Error::from))
        .collect()
}
