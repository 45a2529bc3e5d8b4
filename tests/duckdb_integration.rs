//! Integration tests over a DuckDB table
//!
//! Each test builds its own database file in a temp directory, so the
//! suite needs nothing beyond the bundled DuckDB.

use cursor_pager::{DuckDbStore, Error, Filter, FindParams, Page, Paginator, StorageError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

/// Create a file-backed store with an `orders` table of 12 rows
fn orders_store(dir: &tempfile::TempDir) -> DuckDbStore {
    let store = DuckDbStore::open(dir.path().join("orders.duckdb"), "orders").unwrap();
    store
        .execute_batch(
            "CREATE TABLE orders (
                _id INTEGER,
                customer VARCHAR,
                total DOUBLE,
                placed_at TIMESTAMP
            );
            INSERT INTO orders
            SELECT
                i,
                CASE WHEN i % 3 = 0 THEN 'acme' WHEN i % 3 = 1 THEN 'Globex' ELSE 'initech' END,
                (i % 4) * 10.5,
                TIMESTAMP '2024-01-01 00:00:00' + to_days(CAST(i // 2 AS INTEGER))
            FROM range(1, 13) t(i);",
        )
        .unwrap();
    store
}

fn order_ids(page: &Page<Value>) -> Vec<i64> {
    page.documents
        .iter()
        .map(|d| d["_id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_duckdb_full_forward_walk() {
    let dir = tempfile::tempdir().unwrap();
    let paginator = Paginator::new(orders_store(&dir));
    let cancel = CancellationToken::new();

    let docs = paginator
        .find_all::<Value>(FindParams::new("total", 5), &cancel)
        .await
        .unwrap();

    let ids: Vec<i64> = docs.iter().map(|d| d["_id"].as_i64().unwrap()).collect();
    // total = (i % 4) * 10.5, ties broken by id
    assert_eq!(ids, vec![4, 8, 12, 1, 5, 9, 2, 6, 10, 3, 7, 11]);
}

#[tokio::test]
async fn test_duckdb_timestamps_both_directions() {
    let dir = tempfile::tempdir().unwrap();
    let paginator = Paginator::new(orders_store(&dir));
    let cancel = CancellationToken::new();
    let params = FindParams::new("placed_at", 4).descending();

    let first = paginator.find::<Value>(params.clone(), &cancel).await.unwrap();
    assert_eq!(order_ids(&first), vec![12, 11, 10, 9]);
    assert_eq!(
        first.documents[0]["placed_at"],
        json!({"$date": "2024-01-07T00:00:00+00:00"})
    );

    let second = paginator
        .find::<Value>(
            params.clone().after(first.next_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(order_ids(&second), vec![8, 7, 6, 5]);
    assert!(second.info.has_previous);
    assert!(second.info.has_next);

    let back = paginator
        .find::<Value>(
            params.before(second.previous_cursor().unwrap()),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(back.documents, first.documents);
    assert!(!back.info.has_previous);
    assert!(back.info.has_next);
}

#[tokio::test]
async fn test_duckdb_filter_collation_and_count() {
    let dir = tempfile::tempdir().unwrap();
    let paginator = Paginator::new(orders_store(&dir));
    let cancel = CancellationToken::new();

    let params = FindParams::new("customer", 3)
        .with_filter(Filter::from_json_str(r#"{"total": {"$gt": 0}}"#).unwrap())
        .with_collation(cursor_pager::Collation::new("en").with_strength(2))
        .with_count_total(true);

    let first = paginator.find::<Value>(params.clone(), &cancel).await.unwrap();
    assert_eq!(first.info.total, Some(9));
    assert_eq!(order_ids(&first), vec![3, 6, 9]);

    let second = paginator
        .find::<Value>(params.after(first.next_cursor().unwrap()), &cancel)
        .await
        .unwrap();
    assert_eq!(order_ids(&second), vec![1, 7, 10]);
    assert!(second.documents.iter().all(|d| d["customer"] == "Globex"));
}

#[tokio::test]
async fn test_duckdb_unknown_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let paginator = Paginator::new(orders_store(&dir));

    let err = paginator
        .find::<Value>(FindParams::new("discount", 5), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSortField { ref field, .. } if field == "discount"));

    let err = paginator
        .find::<Value>(
            FindParams::new("total", 5).with_filter(Filter::eq("region", "eu")),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Storage(StorageError::UnsupportedFilter { .. })
    ));
    assert!(err.is_storage_error());
}

#[tokio::test]
async fn test_duckdb_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let first = {
        let paginator = Paginator::new(orders_store(&dir));
        paginator
            .find::<Value>(FindParams::new("_id", 3), &CancellationToken::new())
            .await
            .unwrap()
    };

    let reopened = DuckDbStore::open(dir.path().join("orders.duckdb"), "orders").unwrap();
    let paginator = Paginator::new(reopened);
    let second = paginator
        .find::<Value>(
            FindParams::new("_id", 3).after(first.next_cursor().unwrap()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(order_ids(&first), vec![1, 2, 3]);
    assert_eq!(order_ids(&second), vec![4, 5, 6]);
}

#[tokio::test]
async fn test_duckdb_walk_over_nan_and_infinity() {
    let dir = tempfile::tempdir().unwrap();
    let store = DuckDbStore::open(dir.path().join("scores.duckdb"), "scores").unwrap();
    store
        .execute_batch(
            "CREATE TABLE scores (_id INTEGER, score DOUBLE);
             INSERT INTO scores VALUES
                (1, 1.5), (2, 'NaN'), (3, 'Infinity'), (4, 'NaN'), (5, -1.0);",
        )
        .unwrap();
    let paginator = Paginator::new(store);

    let docs = paginator
        .find_all::<Value>(FindParams::new("score", 1), &CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<i64> = docs.iter().map(|d| d["_id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![5, 1, 3, 2, 4]);
    assert_eq!(docs[3]["score"], json!({"$numberDouble": "NaN"}));
}
