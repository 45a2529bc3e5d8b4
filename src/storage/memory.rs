//! In-memory storage
//!
//! Evaluates filters and sorts in process. Meant for tests, small data sets
//! and the CLI's JSON file input.

use super::types::{Storage, StorageError};
use crate::query::{Filter, QueryRequest, SortSpec};
use crate::types::Collation;
use crate::value::{Document, Scalar};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Document store backed by a `Vec`
#[derive(Debug)]
pub struct MemoryStore<D> {
    documents: RwLock<Vec<D>>,
    sortable_fields: Option<HashSet<String>>,
}

impl<D: Document + Clone> MemoryStore<D> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            sortable_fields: None,
        }
    }

    /// Create a store holding `documents`
    pub fn with_documents(documents: impl IntoIterator<Item = D>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().collect()),
            sortable_fields: None,
        }
    }

    /// Only allow sorting on these fields.
    ///
    /// Queries sorting on anything else fail with
    /// [`StorageError::InvalidSort`], the way a store without a usable index
    /// would reject them.
    #[must_use]
    pub fn with_sortable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Add a document
    pub async fn insert(&self, doc: D) {
        self.documents.write().await.push(doc);
    }

    /// Add several documents
    pub async fn extend(&self, docs: impl IntoIterator<Item = D>) {
        self.documents.write().await.extend(docs);
    }

    /// Remove documents matching a filter, returning how many were removed
    pub async fn remove(&self, filter: &Filter) -> usize {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|doc| !filter.matches(doc, None));
        before - documents.len()
    }

    /// Remove every document
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_sort(&self, sort: &SortSpec) -> Result<(), StorageError> {
        let Some(allowed) = &self.sortable_fields else {
            return Ok(());
        };
        match sort.fields().iter().find(|s| !allowed.contains(&s.field)) {
            Some(s) => Err(StorageError::invalid_sort(
                s.field.clone(),
                "field is not sortable in this store",
            )),
            None => Ok(()),
        }
    }
}

impl<D: Document + Clone> Default for MemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Document + Clone> Storage<D> for MemoryStore<D> {
    async fn query(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<D>, StorageError> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        self.check_sort(&request.sort)?;

        let collation = request.collation.as_ref();
        let mut matched: Vec<D> = {
            let documents = self.documents.read().await;
            documents
                .iter()
                .filter(|doc| request.filter.matches(*doc, collation))
                .cloned()
                .collect()
        };

        matched.sort_by(|a, b| compare_documents(&request.sort, a, b, collation));
        matched.truncate(request.limit);

        tracing::debug!(
            "Memory store matched {} documents (limit {})",
            matched.len(),
            request.limit
        );
        Ok(matched)
    }

    async fn count(
        &self,
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> Result<u64, StorageError> {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        let documents = self.documents.read().await;
        let count = documents.iter().filter(|doc| filter.matches(*doc, None)).count();
        Ok(count as u64)
    }
}

fn compare_documents<D: Document>(
    sort: &SortSpec,
    a: &D,
    b: &D,
    collation: Option<&Collation>,
) -> Ordering {
    for key in sort.fields() {
        let left = a.field(&key.field).unwrap_or(Scalar::Null);
        let right = b.field(&key.field).unwrap_or(Scalar::Null);
        let ordering = key.direction.apply(left.compare(&right, collation));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
