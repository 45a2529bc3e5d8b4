//! Pagination engine module
//!
//! Runs page requests end to end.
//!
//! # Overview
//!
//! [`Paginator`] wires the pieces together for one storage collaborator:
//!
//! 1. [`QueryPlanner`] validates the request and builds the storage query
//! 2. the store runs the query, and the count when one was asked for
//! 3. [`PageAssembler`] shapes the result and encodes boundary cursors
//!
//! The paginator keeps no state between calls. Position lives entirely in
//! the cursor strings handed back to the caller.

mod types;

pub use types::WalkStats;

use crate::config::PaginatorConfig;
use crate::cursor::CursorCodec;
use crate::error::Result;
use crate::page::{Page, PageAssembler};
use crate::query::{FindParams, QueryPlanner};
use crate::storage::Storage;
use crate::value::Document;
use futures::stream::{self, Stream, TryStreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Cursor-based paginator over a storage collaborator
#[derive(Debug)]
pub struct Paginator<S> {
    storage: Arc<S>,
    config: PaginatorConfig,
    planner: QueryPlanner,
    assembler: PageAssembler,
}

impl<S> Clone for Paginator<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config.clone(),
            planner: self.planner.clone(),
            assembler: self.assembler,
        }
    }
}

impl<S> Paginator<S> {
    /// Create a paginator with default configuration
    pub fn new(storage: S) -> Self {
        Self::from_arc(Arc::new(storage), PaginatorConfig::default())
    }

    /// Create a paginator with the given configuration
    pub fn with_config(storage: S, config: PaginatorConfig) -> Self {
        Self::from_arc(Arc::new(storage), config)
    }

    /// Create a paginator sharing an existing storage handle
    pub fn from_arc(storage: Arc<S>, config: PaginatorConfig) -> Self {
        let planner = QueryPlanner::new(&config);
        let assembler = PageAssembler::new(CursorCodec::new(config.max_cursor_bytes));
        Self {
            storage,
            config,
            planner,
            assembler,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    /// Get the storage collaborator
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Parameters for a first page using the configured defaults
    pub fn params(&self, paginated_field: impl Into<String>) -> FindParams {
        FindParams::new(paginated_field, i64::from(self.config.default_limit))
            .with_count_total(self.config.count_total)
    }

    /// Fetch one page.
    ///
    /// Input errors are reported before storage is called. The query and
    /// the optional count run concurrently; both receive `cancel` as is.
    pub async fn find<D>(&self, params: FindParams, cancel: &CancellationToken) -> Result<Page<D>>
    where
        S: Storage<D>,
        D: Document,
    {
        let plan = self.planner.plan(&params)?;

        let (fetched, total) = match &plan.count_filter {
            Some(filter) => {
                let (fetched, total) = futures::try_join!(
                    self.storage.query(&plan.request, cancel),
                    self.storage.count(filter, cancel)
                )?;
                (fetched, Some(total))
            }
            None => (self.storage.query(&plan.request, cancel).await?, None),
        };

        tracing::debug!(
            "Fetched {} documents for '{}' (limit {})",
            fetched.len(),
            plan.paginated_field,
            plan.limit
        );

        self.assembler.assemble(&plan, fetched, total)
    }

    /// Walk forward page by page, starting from `params`.
    ///
    /// The stream follows each page's `next_cursor` and ends after the page
    /// with `has_next == false`, or at the first error.
    pub fn walk<'a, D>(
        &'a self,
        params: FindParams,
        cancel: &'a CancellationToken,
    ) -> impl Stream<Item = Result<Page<D>>> + 'a
    where
        S: Storage<D>,
        D: Document + 'a,
    {
        stream::try_unfold(Some(params), move |state| async move {
            let Some(params) = state else {
                return Ok(None);
            };

            let page = self.find(params.clone(), cancel).await?;
            let next = match (&page.info.next_cursor, page.info.has_next) {
                (Some(cursor), true) => Some(params.after(cursor.clone())),
                _ => None,
            };
            Ok(Some((page, next)))
        })
    }

    /// Collect every document from `params` onwards
    pub async fn find_all<D>(&self, params: FindParams, cancel: &CancellationToken) -> Result<Vec<D>>
    where
        S: Storage<D>,
        D: Document,
    {
        self.walk(params, cancel)
            .try_fold(Vec::new(), |mut documents, page| async move {
                documents.extend(page.documents);
                Ok(documents)
            })
            .await
    }
}

#[cfg(test)]
mod tests;
