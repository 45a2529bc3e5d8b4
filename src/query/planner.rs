//! Query planning
//!
//! Turns [`FindParams`] into a [`QueryPlan`]: validates the request,
//! decodes the cursor, conjoins the keyset bound with the caller's filter
//! and picks the sort order to fetch in.

use super::filter::{Filter, Operator};
use super::types::{FetchMode, FindParams, QueryPlan, QueryRequest, SortField, SortSpec};
use crate::config::PaginatorConfig;
use crate::cursor::{CursorCodec, CursorDirection, PaginationKey};
use crate::error::{Error, Result};
use crate::types::SortDirection;

/// Builds storage queries from page requests
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    codec: CursorCodec,
    id_field: String,
    max_limit: Option<u32>,
}

impl QueryPlanner {
    /// Create a planner from configuration
    pub fn new(config: &PaginatorConfig) -> Self {
        Self {
            codec: CursorCodec::new(config.max_cursor_bytes),
            id_field: config.id_field.clone(),
            max_limit: config.max_limit,
        }
    }

    /// Tie-breaker id field
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Plan a page request.
    ///
    /// Every input error is raised here, before storage is touched.
    pub fn plan(&self, params: &FindParams) -> Result<QueryPlan> {
        let limit = self.validate_limit(params.limit)?;

        let next = non_empty(params.next.as_deref());
        let previous = non_empty(params.previous.as_deref());
        if next.is_some() && previous.is_some() {
            return Err(Error::ConflictingCursors);
        }

        let field = params.paginated_field.as_str();
        if field.trim().is_empty() {
            return Err(Error::invalid_sort_field(
                field,
                "paginated field name cannot be empty",
            ));
        }

        let mode = match (next, previous) {
            (Some(cursor), _) => {
                FetchMode::After(self.decode(cursor, field, CursorDirection::Next)?)
            }
            (_, Some(cursor)) => {
                FetchMode::Before(self.decode(cursor, field, CursorDirection::Previous)?)
            }
            _ => FetchMode::First,
        };

        let sort = self.sort_spec(field, params.direction);
        let (filter, sort) = match &mode {
            FetchMode::First => (params.filter.clone(), sort),
            FetchMode::After(key) => {
                let op = strictly_after(params.direction);
                let bound = keyset_bound(field, &self.id_field, key, op);
                (params.filter.clone().and(bound), sort)
            }
            FetchMode::Before(key) => {
                let op = strictly_after(params.direction.reversed());
                let bound = keyset_bound(field, &self.id_field, key, op);
                (params.filter.clone().and(bound), sort.reversed())
            }
        };

        let request = QueryRequest {
            filter,
            sort,
            limit: limit + 1,
            collation: params.collation.clone(),
            projection: params
                .projection
                .as_ref()
                .map(|fields| self.project(fields, field)),
            hint: params.hint.clone(),
        };

        tracing::debug!(
            "Planned {} fetch on '{}': filter={}, limit={}",
            mode_name(&mode),
            field,
            request.filter,
            request.limit
        );

        Ok(QueryPlan {
            request,
            count_filter: params.count_total.then(|| params.filter.clone()),
            mode,
            limit,
            paginated_field: field.to_string(),
            id_field: self.id_field.clone(),
        })
    }

    fn validate_limit(&self, limit: i64) -> Result<usize> {
        if limit < 1 {
            return Err(Error::invalid_limit(limit, "limit must be at least 1"));
        }
        if let Some(max) = self.max_limit {
            if limit > i64::from(max) {
                return Err(Error::invalid_limit(
                    limit,
                    format!("limit exceeds the maximum of {max}"),
                ));
            }
        }
        // One extra document is fetched to detect more results
        usize::try_from(limit)
            .ok()
            .filter(|l| *l < usize::MAX)
            .ok_or_else(|| Error::invalid_limit(limit, "limit is too large"))
    }

    fn decode(
        &self,
        cursor: &str,
        field: &str,
        direction: CursorDirection,
    ) -> Result<PaginationKey> {
        self.codec
            .decode_for(cursor, field, direction)
            .inspect_err(|e| tracing::warn!("Rejected {} cursor: {}", direction, e))
    }

    fn sort_spec(&self, field: &str, direction: SortDirection) -> SortSpec {
        if field == self.id_field {
            return SortSpec(vec![SortField::new(field, direction)]);
        }
        SortSpec(vec![
            SortField::new(field, direction),
            SortField::new(self.id_field.clone(), direction),
        ])
    }

    fn project(&self, fields: &[String], paginated_field: &str) -> Vec<String> {
        let mut projection = fields.to_vec();
        for required in [paginated_field, self.id_field.as_str()] {
            if !projection.iter().any(|f| f == required) {
                projection.push(required.to_string());
            }
        }
        projection
    }
}

/// Operator selecting keys strictly after a position in `direction`
fn strictly_after(direction: SortDirection) -> Operator {
    if direction.is_ascending() {
        Operator::Gt
    } else {
        Operator::Lt
    }
}

/// Lexicographic bound on `(field, id)`:
/// `field OP v OR (field == v AND id OP id_v)`
pub fn keyset_bound(field: &str, id_field: &str, key: &PaginationKey, op: Operator) -> Filter {
    if field == id_field {
        return Filter::compare(id_field, op, key.id().clone());
    }

    let value = key.field_value().clone();
    Filter::compare(field, op, value.clone()).or(
        Filter::eq(field, value).and(Filter::compare(id_field, op, key.id().clone())),
    )
}

fn non_empty(cursor: Option<&str>) -> Option<&str> {
    cursor.filter(|c| !c.is_empty())
}

fn mode_name(mode: &FetchMode) -> &'static str {
    match mode {
        FetchMode::First => "first",
        FetchMode::After(_) => "next",
        FetchMode::Before(_) => "previous",
    }
}
