//! Tests for engine module

use super::*;
use crate::error::Error;
use crate::query::{Filter, QueryRequest};
use crate::storage::{MemoryStore, StorageError};
use crate::types::JsonValue;
use crate::value::Scalar;
use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Helpers
// ============================================================================

/// Memory store that counts the calls it receives
struct CountingStore {
    inner: MemoryStore<JsonValue>,
    queries: AtomicUsize,
    counts: AtomicUsize,
}

impl CountingStore {
    fn new(docs: Vec<JsonValue>) -> Self {
        Self {
            inner: MemoryStore::with_documents(docs),
            queries: AtomicUsize::new(0),
            counts: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst) + self.counts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage<JsonValue> for CountingStore {
    async fn query(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<JsonValue>, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(request, cancel).await
    }

    async fn count(
        &self,
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> std::result::Result<u64, StorageError> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count(filter, cancel).await
    }
}

fn ranked_docs() -> Vec<JsonValue> {
    vec![
        json!({"_id": "c", "rank": 2}),
        json!({"_id": "e", "rank": 5}),
        json!({"_id": "a", "rank": 1}),
        json!({"_id": "d", "rank": 3}),
        json!({"_id": "b", "rank": 1}),
    ]
}

fn ranked() -> Paginator<CountingStore> {
    Paginator::new(CountingStore::new(ranked_docs()))
}

/// Collection with many duplicate ranks and a few missing ones
fn duplicate_docs() -> Vec<JsonValue> {
    let ranks = [3, 1, 2, 3, 1, 5, 2, 3, 3, 0, 5, 1];
    let mut docs: Vec<JsonValue> = ranks
        .iter()
        .enumerate()
        .map(|(i, rank)| json!({"_id": format!("doc{i:02}"), "rank": rank}))
        .collect();
    docs.push(json!({"_id": "doc12"}));
    docs.push(json!({"_id": "doc13", "rank": null}));
    docs
}

fn ids(page: &Page<JsonValue>) -> Vec<String> {
    page.documents
        .iter()
        .map(|d| d["_id"].as_str().unwrap().to_string())
        .collect()
}

fn sorted_ids(docs: &[JsonValue], descending: bool) -> Vec<String> {
    let mut keyed: Vec<(Scalar, String)> = docs
        .iter()
        .map(|d| {
            let rank = d.get("rank").map_or(Scalar::Null, |r| Scalar::from_json(r).unwrap());
            (rank, d["_id"].as_str().unwrap().to_string())
        })
        .collect();
    keyed.sort();
    if descending {
        keyed.reverse();
    }
    keyed.into_iter().map(|(_, id)| id).collect()
}

// ============================================================================
// Concrete Scenario
// ============================================================================

#[tokio::test]
async fn test_rank_scenario_forward() {
    let paginator = ranked();
    let cancel = CancellationToken::new();

    let first = paginator
        .find::<JsonValue>(FindParams::new("rank", 2), &cancel)
        .await
        .unwrap();
    assert_eq!(ids(&first), vec!["a", "b"]);
    assert!(first.info.has_next);
    assert!(!first.info.has_previous);
    assert_eq!(first.previous_cursor(), None);

    let key = CursorCodec::default()
        .decode(first.next_cursor().unwrap())
        .unwrap()
        .key;
    assert_eq!(key, crate::cursor::PaginationKey::new(1, "b"));

    let second = paginator
        .find::<JsonValue>(
            FindParams::new("rank", 2).after(first.next_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(ids(&second), vec!["c", "d"]);
    assert!(second.info.has_next);
    assert!(second.info.has_previous);

    let third = paginator
        .find::<JsonValue>(
            FindParams::new("rank", 2).after(second.next_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(ids(&third), vec!["e"]);
    assert!(!third.info.has_next);
    assert!(third.info.has_previous);
    assert_eq!(third.next_cursor(), None);
}

#[tokio::test]
async fn test_rank_scenario_backward() {
    let paginator = ranked();
    let cancel = CancellationToken::new();

    let all = paginator
        .find::<JsonValue>(FindParams::new("rank", 4), &cancel)
        .await
        .unwrap();
    let last = paginator
        .find::<JsonValue>(
            FindParams::new("rank", 4).after(all.next_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(ids(&last), vec!["e"]);

    let back = paginator
        .find::<JsonValue>(
            FindParams::new("rank", 2).before(last.previous_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(ids(&back), vec!["c", "d"]);
    assert!(back.info.has_next);
    assert!(back.info.has_previous);

    let start = paginator
        .find::<JsonValue>(
            FindParams::new("rank", 2).before(back.previous_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(ids(&start), vec!["a", "b"]);
    assert!(start.info.has_next);
    assert!(!start.info.has_previous);
    assert_eq!(start.previous_cursor(), None);
}

// ============================================================================
// Input Errors
// ============================================================================

#[tokio::test]
async fn test_zero_limit_fails_without_storage_call() {
    let paginator = ranked();
    let err = paginator
        .find::<JsonValue>(
            FindParams::new("rank", 0).with_count_total(true),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidLimit { limit: 0, .. }));
    assert!(err.is_input_error());
    assert_eq!(paginator.storage().calls(), 0);
}

#[tokio::test]
async fn test_conflicting_cursors_fail_without_storage_call() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    let first = paginator
        .find::<JsonValue>(FindParams::new("rank", 2), &cancel)
        .await
        .unwrap();
    let calls = paginator.storage().calls();

    let mut params = FindParams::new("rank", 2);
    params.next = first.info.next_cursor.clone();
    params.previous = Some("anything".to_string());

    let err = paginator
        .find::<JsonValue>(params, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConflictingCursors));
    assert_eq!(paginator.storage().calls(), calls);
}

#[tokio::test]
async fn test_tampered_cursor_fails_without_storage_call() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    let first = paginator
        .find::<JsonValue>(FindParams::new("rank", 2), &cancel)
        .await
        .unwrap();
    let calls = paginator.storage().calls();

    let mut cursor = first.next_cursor().unwrap().to_string();
    let last = cursor.pop().unwrap();
    cursor.push(if last == 'A' { 'B' } else { 'A' });

    let err = paginator
        .find::<JsonValue>(FindParams::new("rank", 2).after(cursor), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCursor { .. }));
    assert_eq!(paginator.storage().calls(), calls);
}

#[tokio::test]
async fn test_cursor_for_other_field_is_rejected() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    let first = paginator
        .find::<JsonValue>(FindParams::new("rank", 2), &cancel)
        .await
        .unwrap();

    let err = paginator
        .find::<JsonValue>(
            FindParams::new("_id", 2).after(first.next_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCursor { .. }));
}

#[tokio::test]
async fn test_unsortable_field_surfaces_as_invalid_sort_field() {
    let store = MemoryStore::with_documents(ranked_docs()).with_sortable_fields(["rank", "_id"]);
    let paginator = Paginator::new(store);

    let err = paginator
        .find::<JsonValue>(FindParams::new("name", 2), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSortField { ref field, .. } if field == "name"));
}

#[tokio::test]
async fn test_cancellation_is_propagated() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = paginator
        .find::<JsonValue>(FindParams::new("rank", 2).with_count_total(true), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Cancelled)));
    assert!(err.is_storage_error());
}

// ============================================================================
// Ordering Properties
// ============================================================================

#[tokio::test]
async fn test_forward_coverage_for_every_limit() {
    let docs = duplicate_docs();
    let paginator = Paginator::new(MemoryStore::with_documents(docs.clone()));
    let cancel = CancellationToken::new();

    for descending in [false, true] {
        let expected = sorted_ids(&docs, descending);
        for limit in 1..=docs.len() {
            let mut params = FindParams::new("rank", limit as i64);
            if descending {
                params = params.descending();
            }

            let pages: Vec<Page<JsonValue>> = paginator
                .walk(params, &cancel)
                .try_collect()
                .await
                .unwrap();

            let visited: Vec<String> = pages.iter().flat_map(ids).collect();
            assert_eq!(visited, expected, "limit={limit} descending={descending}");

            assert!(!pages[0].info.has_previous);
            assert!(!pages[pages.len() - 1].info.has_next);
            assert!(pages.iter().all(|p| p.len() <= limit));
        }
    }
}

#[tokio::test]
async fn test_backward_reproduces_preceding_page() {
    let docs = duplicate_docs();
    let paginator = Paginator::new(MemoryStore::with_documents(docs));
    let cancel = CancellationToken::new();

    for limit in [1_i64, 2, 3, 5] {
        let pages: Vec<Page<JsonValue>> = paginator
            .walk(FindParams::new("rank", limit), &cancel)
            .try_collect()
            .await
            .unwrap();

        for i in 1..pages.len() {
            let back = paginator
                .find::<JsonValue>(
                    FindParams::new("rank", limit).before(pages[i].previous_cursor().unwrap()),
                    &cancel,
                )
                .await
                .unwrap();

            assert_eq!(ids(&back), ids(&pages[i - 1]), "limit={limit} page={i}");
            assert!(back.info.has_next);
            assert_eq!(back.info.has_previous, i > 1);
        }
    }
}

#[tokio::test]
async fn test_same_cursor_twice_gives_same_page() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    let first = paginator
        .find::<JsonValue>(FindParams::new("rank", 2), &cancel)
        .await
        .unwrap();
    let params = FindParams::new("rank", 2).after(first.next_cursor().unwrap());

    let a = paginator.find::<JsonValue>(params.clone(), &cancel).await.unwrap();
    let b = paginator.find::<JsonValue>(params, &cancel).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_insert_between_pages_is_not_duplicated() {
    let store = Arc::new(MemoryStore::with_documents(ranked_docs()));
    let paginator = Paginator::from_arc(Arc::clone(&store), PaginatorConfig::default());
    let cancel = CancellationToken::new();

    let first = paginator
        .find::<JsonValue>(FindParams::new("rank", 2), &cancel)
        .await
        .unwrap();

    // Lands before the cursor; must not show up again or shift later pages
    store.insert(json!({"_id": "aa", "rank": 0})).await;

    let rest = paginator
        .find_all::<JsonValue>(FindParams::new("rank", 2).after(first.next_cursor().unwrap()), &cancel)
        .await
        .unwrap();
    let rest: Vec<&str> = rest.iter().map(|d| d["_id"].as_str().unwrap()).collect();
    assert_eq!(rest, vec!["c", "d", "e"]);
}

// ============================================================================
// Count, Filters and Defaults
// ============================================================================

#[tokio::test]
async fn test_total_counts_original_filter() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    let params = FindParams::new("rank", 1)
        .with_filter(Filter::lte("rank", 3))
        .with_count_total(true);

    let first = paginator.find::<JsonValue>(params.clone(), &cancel).await.unwrap();
    assert_eq!(first.info.total, Some(4));

    let second = paginator
        .find::<JsonValue>(params.after(first.next_cursor().unwrap()), &cancel)
        .await
        .unwrap();
    assert_eq!(ids(&second), vec!["b"]);
    assert_eq!(second.info.total, Some(4));
}

#[tokio::test]
async fn test_no_count_unless_requested() {
    let paginator = ranked();
    let page = paginator
        .find::<JsonValue>(FindParams::new("rank", 2), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.info.total, None);
    assert_eq!(paginator.storage().counts.load(Ordering::SeqCst), 0);
    assert_eq!(paginator.storage().queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_collection() {
    let paginator = Paginator::new(MemoryStore::<JsonValue>::new());
    let page = paginator
        .find::<JsonValue>(
            FindParams::new("rank", 10).with_count_total(true),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(page.is_empty());
    assert!(!page.info.has_next);
    assert!(!page.info.has_previous);
    assert_eq!(page.next_cursor(), None);
    assert_eq!(page.previous_cursor(), None);
    assert_eq!(page.info.total, Some(0));
}

#[tokio::test]
async fn test_params_use_config_defaults() {
    let config = PaginatorConfig::default()
        .with_default_limit(3)
        .with_count_total(true);
    let paginator = Paginator::with_config(MemoryStore::with_documents(ranked_docs()), config);

    let page = paginator
        .find::<JsonValue>(paginator.params("rank"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page.info.total, Some(5));
}

#[tokio::test]
async fn test_paginate_on_id_field() {
    let paginator = ranked();
    let docs = paginator
        .find_all::<JsonValue>(FindParams::new("_id", 2).descending(), &CancellationToken::new())
        .await
        .unwrap();
    let visited: Vec<&str> = docs.iter().map(|d| d["_id"].as_str().unwrap()).collect();
    assert_eq!(visited, vec!["e", "d", "c", "b", "a"]);
}

#[tokio::test]
async fn test_walk_stops_at_last_page() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    let mut pages = Box::pin(paginator.walk::<JsonValue>(FindParams::new("rank", 2), &cancel));

    let mut count = 0;
    while let Some(page) = pages.next().await {
        page.unwrap();
        count += 1;
    }
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_walk_visits_mixed_large_numbers_once() {
    let two_53 = 9_007_199_254_740_992_i64;
    let paginator = Paginator::new(MemoryStore::with_documents(vec![
        json!({"_id": "a", "rank": two_53 + 1}),
        json!({"_id": "b", "rank": two_53 as f64}),
        json!({"_id": "c", "rank": two_53}),
    ]));
    let cancel = CancellationToken::new();

    let pages: Vec<Page<JsonValue>> = paginator
        .walk(FindParams::new("rank", 1), &cancel)
        .take(8)
        .map(|page| page.unwrap())
        .collect()
        .await;

    let seen: Vec<String> = pages.iter().flat_map(ids).collect();
    assert_eq!(seen, vec!["b", "c", "a"]);
    assert_eq!(pages.len(), 3);
}

#[tokio::test]
async fn test_walk_ends_at_first_error() {
    let paginator = ranked();
    let cancel = CancellationToken::new();
    let results: Vec<Result<Page<JsonValue>>> = paginator
        .walk(FindParams::new("rank", -1), &cancel)
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(Error::InvalidLimit { .. })));
}

// ============================================================================
// Custom Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Reading {
    id: u32,
    score: Option<f64>,
}

impl Document for Reading {
    fn field(&self, name: &str) -> Option<Scalar> {
        match name {
            "_id" => Some(Scalar::Int(i64::from(self.id))),
            "score" => self.score.map(Scalar::Float),
            _ => None,
        }
    }
}

#[tokio::test]
async fn test_custom_document_type() {
    let readings = vec![
        Reading { id: 1, score: Some(0.5) },
        Reading { id: 2, score: None },
        Reading { id: 3, score: Some(-1.0) },
        Reading { id: 4, score: Some(0.5) },
    ];
    let paginator = Paginator::new(MemoryStore::with_documents(readings));

    let all = paginator
        .find_all::<Reading>(FindParams::new("score", 1), &CancellationToken::new())
        .await
        .unwrap();
    let order: Vec<u32> = all.iter().map(|r| r.id).collect();
    assert_eq!(order, vec![2, 3, 1, 4]);
}
