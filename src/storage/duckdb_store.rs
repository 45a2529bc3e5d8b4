//! DuckDB-backed storage
//!
//! Pages over a single DuckDB table. Filters are translated into
//! parameterized SQL; identifiers are checked against the table's columns
//! and always quoted. Rows come back as JSON objects, with timestamps and
//! 12-byte blobs in extended JSON so they read back as the same [`Scalar`].
//!
//! SQL `NULL` plays the role of a missing field and sorts before every
//! other value, matching [`Scalar`] ordering.

use super::types::{Storage, StorageError};
use crate::query::{Filter, Operator, QueryRequest, SortSpec};
use crate::types::{Collation, JsonObject, JsonValue};
use crate::value::Scalar;
use async_trait::async_trait;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex};
use tokio_util::sync::CancellationToken;

/// Plain SQL identifiers only; anything else is rejected rather than escaped
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A table column
#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    name: String,
    data_type: String,
}

impl Column {
    fn is_text(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("VARCHAR")
    }
}

/// Document store over a DuckDB table
pub struct DuckDbStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl std::fmt::Debug for DuckDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl DuckDbStore {
    /// Wrap an open connection, paginating over `table`
    pub fn new(conn: Connection, table: impl Into<String>) -> Result<Self, StorageError> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(StorageError::backend(format!(
                "invalid table name '{table}'"
            )));
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table,
        })
    }

    /// Open a database file
    pub fn open(path: impl AsRef<Path>, table: impl Into<String>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::new(conn, table)
    }

    /// Open an in-memory database
    pub fn open_in_memory(table: impl Into<String>) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::new(conn, table)
    }

    /// Table being paginated
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Run SQL statements directly (schema setup, seeding)
    pub fn execute_batch(&self, sql: &str) -> Result<(), StorageError> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run blocking work on the connection without stalling the runtime.
    ///
    /// Cancellation stops the wait; DuckDB finishes the statement in the
    /// background and its result is discarded.
    async fn run<T, F>(&self, cancel: &CancellationToken, work: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        let conn = Arc::clone(&self.conn);
        let task = tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            work(&conn)
        });

        tokio::select! {
            () = cancel.cancelled() => Err(StorageError::Cancelled),
            joined = task => joined
                .map_err(|e| StorageError::backend(format!("query task failed: {e}")))?,
        }
    }
}

#[async_trait]
impl Storage<JsonValue> for DuckDbStore {
    async fn query(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<JsonValue>, StorageError> {
        let table = self.table.clone();
        let request = request.clone();

        self.run(cancel, move |conn| {
            let columns = table_columns(conn, &table)?;
            let selected = select_columns(&columns, request.projection.as_deref())?;
            let ordering = order_by(&columns, &request.sort, request.collation.as_ref())?;

            let mut builder = SqlBuilder::new(&columns, request.collation.as_ref());
            let condition = builder.filter(&request.filter)?;

            let select_list = selected
                .iter()
                .map(|c| quote(&c.name))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT {select_list} FROM {} WHERE {condition} ORDER BY {ordering} LIMIT {}",
                quote(&table),
                request.limit
            );

            if let Some(hint) = &request.hint {
                tracing::debug!("Ignoring index hint '{}' (not supported by DuckDB)", hint);
            }
            tracing::debug!("Executing query: {}", sql);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(duckdb::params_from_iter(builder.params), |row| {
                let mut doc = JsonObject::new();
                for (i, column) in selected.iter().enumerate() {
                    let value: Value = row.get(i)?;
                    doc.insert(column.name.clone(), duckdb_value_to_json(value));
                }
                Ok(JsonValue::Object(doc))
            })?;

            let documents = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(documents)
        })
        .await
    }

    async fn count(
        &self,
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> Result<u64, StorageError> {
        let table = self.table.clone();
        let filter = filter.clone();

        self.run(cancel, move |conn| {
            let columns = table_columns(conn, &table)?;
            let mut builder = SqlBuilder::new(&columns, None);
            let condition = builder.filter(&filter)?;

            let sql = format!("SELECT COUNT(*) FROM {} WHERE {condition}", quote(&table));
            tracing::debug!("Executing count: {}", sql);

            let count: i64 =
                conn.query_row(&sql, duckdb::params_from_iter(builder.params), |row| {
                    row.get(0)
                })?;
            Ok(count as u64)
        })
        .await
    }
}

// ============================================================================
// SQL Building
// ============================================================================

/// Accumulates a WHERE clause and its positional parameters
struct SqlBuilder<'a> {
    columns: &'a [Column],
    collation: Option<&'a Collation>,
    params: Vec<Value>,
}

impl<'a> SqlBuilder<'a> {
    fn new(columns: &'a [Column], collation: Option<&'a Collation>) -> Self {
        Self {
            columns,
            collation,
            params: Vec::new(),
        }
    }

    fn filter(&mut self, filter: &Filter) -> Result<String, StorageError> {
        match filter {
            Filter::All => Ok("TRUE".to_string()),
            Filter::Compare { field, op, value } => {
                let column = self.column(field)?;
                Ok(self.compare(&column, *op, value))
            }
            Filter::In { field, values } => {
                let column = self.column(field)?;
                let (nulls, present): (Vec<&Scalar>, Vec<&Scalar>) =
                    values.iter().partition(|v| v.is_null());

                let mut parts = Vec::new();
                if !present.is_empty() {
                    let placeholders = present
                        .iter()
                        .map(|v| self.param(v))
                        .collect::<Vec<_>>()
                        .join(", ");
                    parts.push(format!("COALESCE({column} IN ({placeholders}), FALSE)"));
                }
                if !nulls.is_empty() {
                    parts.push(format!("{column} IS NULL"));
                }

                Ok(match parts.len() {
                    0 => "FALSE".to_string(),
                    1 => parts.remove(0),
                    _ => format!("({})", parts.join(" OR ")),
                })
            }
            Filter::Exists { field, exists } => {
                let column = self.column(field)?;
                Ok(if *exists {
                    format!("{column} IS NOT NULL")
                } else {
                    format!("{column} IS NULL")
                })
            }
            Filter::And(filters) => self.join(filters, " AND ", "TRUE"),
            Filter::Or(filters) => self.join(filters, " OR ", "FALSE"),
            Filter::Not(inner) => Ok(format!("NOT ({})", self.filter(inner)?)),
        }
    }

    fn join(&mut self, filters: &[Filter], sep: &str, empty: &str) -> Result<String, StorageError> {
        if filters.is_empty() {
            return Ok(empty.to_string());
        }
        let parts = filters
            .iter()
            .map(|f| self.filter(f).map(|sql| format!("({sql})")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(sep))
    }

    /// Comparisons never yield SQL NULL: a NULL column is less than any
    /// value and equal only to null.
    fn compare(&mut self, column: &str, op: Operator, value: &Scalar) -> String {
        if value.is_null() {
            return match op {
                Operator::Eq | Operator::Lte => format!("{column} IS NULL"),
                Operator::Ne | Operator::Gt => format!("{column} IS NOT NULL"),
                Operator::Gte => "TRUE".to_string(),
                Operator::Lt => "FALSE".to_string(),
            };
        }

        let placeholder = self.param(value);
        let (symbol, when_null) = match op {
            Operator::Eq => ("=", "FALSE"),
            Operator::Ne => ("<>", "TRUE"),
            Operator::Gt => (">", "FALSE"),
            Operator::Gte => (">=", "FALSE"),
            Operator::Lt => ("<", "TRUE"),
            Operator::Lte => ("<=", "TRUE"),
        };
        format!("COALESCE({column} {symbol} {placeholder}, {when_null})")
    }

    fn column(&self, field: &str) -> Result<String, StorageError> {
        let column = find_column(self.columns, field)
            .ok_or_else(|| StorageError::unsupported_filter(format!("unknown column '{field}'")))?;
        Ok(column_expr(column, self.collation))
    }

    fn param(&mut self, value: &Scalar) -> String {
        self.params.push(scalar_to_duckdb(value));
        "?".to_string()
    }
}

fn order_by(
    columns: &[Column],
    sort: &SortSpec,
    collation: Option<&Collation>,
) -> Result<String, StorageError> {
    if sort.fields().is_empty() {
        return Ok("1".to_string());
    }

    let keys = sort
        .fields()
        .iter()
        .map(|key| {
            let column = find_column(columns, &key.field).ok_or_else(|| {
                StorageError::invalid_sort(key.field.clone(), "no such column")
            })?;
            // Nulls sort lowest in both directions
            let direction = if key.direction.is_ascending() {
                "ASC NULLS FIRST"
            } else {
                "DESC NULLS LAST"
            };
            Ok(format!("{} {direction}", column_expr(column, collation)))
        })
        .collect::<Result<Vec<_>, StorageError>>()?;

    Ok(keys.join(", "))
}

fn select_columns(
    columns: &[Column],
    projection: Option<&[String]>,
) -> Result<Vec<Column>, StorageError> {
    let Some(fields) = projection else {
        return Ok(columns.to_vec());
    };

    fields
        .iter()
        .map(|field| {
            find_column(columns, field)
                .cloned()
                .ok_or_else(|| StorageError::backend(format!("unknown column '{field}' in projection")))
        })
        .collect()
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<Column>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_name = ? ORDER BY ordinal_position",
    )?;
    let columns = stmt
        .query_map(duckdb::params![table], |row| {
            Ok(Column {
                name: row.get(0)?,
                data_type: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(StorageError::backend(format!("table '{table}' not found")));
    }
    Ok(columns)
}

fn find_column<'c>(columns: &'c [Column], field: &str) -> Option<&'c Column> {
    if !is_identifier(field) {
        return None;
    }
    columns.iter().find(|c| c.name == field)
}

fn column_expr(column: &Column, collation: Option<&Collation>) -> String {
    let quoted = quote(&column.name);
    match collation {
        Some(c) if column.is_text() && c.ignores_accents() => {
            format!("{quoted} COLLATE NOCASE.NOACCENT")
        }
        Some(c) if column.is_text() && c.ignores_case() => format!("{quoted} COLLATE NOCASE"),
        _ => quoted,
    }
}

fn is_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
    conn.lock()
        .map_err(|_| StorageError::backend("connection lock poisoned"))
}

// ============================================================================
// Value Conversion
// ============================================================================

fn scalar_to_duckdb(value: &Scalar) -> Value {
    match value {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Boolean(*b),
        Scalar::Int(i) => Value::BigInt(*i),
        Scalar::Float(f) => Value::Double(*f),
        Scalar::String(s) => Value::Text(s.clone()),
        Scalar::Timestamp(ts) => Value::Timestamp(TimeUnit::Microsecond, ts.timestamp_micros()),
        Scalar::ObjectId(oid) => Value::Blob(oid.to_vec()),
    }
}

/// Convert a DuckDB value to JSON
fn duckdb_value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::Number(i.into()),
        Value::SmallInt(i) => JsonValue::Number(i.into()),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::BigInt(i) => JsonValue::Number(i.into()),
        Value::HugeInt(i) => JsonValue::String(i.to_string()),
        Value::UTinyInt(i) => JsonValue::Number(i.into()),
        Value::USmallInt(i) => JsonValue::Number(i.into()),
        Value::UInt(i) => JsonValue::Number(i.into()),
        Value::UBigInt(i) => JsonValue::Number(i.into()),
        Value::Float(f) => Scalar::Float(f64::from(f)).to_json(),
        Value::Double(f) => Scalar::Float(f).to_json(),
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(b) => match <[u8; 12]>::try_from(b.as_slice()) {
            Ok(oid) => Scalar::ObjectId(oid).to_json(),
            Err(_) => JsonValue::String(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                b,
            )),
        },
        Value::Timestamp(unit, t) => {
            let micros = match unit {
                TimeUnit::Second => t.saturating_mul(1_000_000),
                TimeUnit::Millisecond => t.saturating_mul(1_000),
                TimeUnit::Microsecond => t,
                TimeUnit::Nanosecond => t / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros)
                .map_or(JsonValue::Number(t.into()), |dt| Scalar::Timestamp(dt).to_json())
        }
        Value::Date32(d) => {
            // Days since epoch (719163 is the number of days from 1 CE to 1970-01-01)
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map_or(JsonValue::Number(d.into()), |date| {
                    JsonValue::String(date.format("%Y-%m-%d").to_string())
                })
        }
        other => JsonValue::String(format!("{other:?}")),
    }
}
