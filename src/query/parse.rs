//! JSON filter parsing
//!
//! Accepts the familiar document-query shape:
//!
//! ```text
//! {"status": "active", "rank": {"$gte": 2, "$lt": 10}}
//! {"$or": [{"tag": {"$in": ["a", "b"]}}, {"deleted": {"$exists": false}}]}
//! {"createdAt": {"$gt": {"$date": "2024-01-01T00:00:00Z"}}}
//! ```
//!
//! Top-level keys are conjoined. Values use [`Scalar::from_json`], so
//! extended JSON (`$date`, `$oid`) works anywhere a value is expected.

use super::filter::{Filter, Operator};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use crate::value::Scalar;

impl Filter {
    /// Parse a filter from a JSON string
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(input)
            .map_err(|e| Error::filter(format!("filter is not valid JSON: {e}")))?;
        Self::from_json(&value)
    }

    /// Parse a filter from a JSON value.
    ///
    /// `null` and `{}` both mean "match everything".
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(Filter::All),
            JsonValue::Object(map) => parse_document(map),
            other => Err(Error::filter(format!(
                "filter must be a JSON object, got {other}"
            ))),
        }
    }
}

fn parse_document(map: &JsonObject) -> Result<Filter> {
    let mut filter = Filter::All;
    for (key, value) in map {
        let clause = match key.as_str() {
            "$and" => parse_list(key, value)?
                .into_iter()
                .fold(Filter::All, Filter::and),
            "$or" => {
                let parts = parse_list(key, value)?;
                Filter::Or(parts)
            }
            "$nor" => Filter::not(Filter::Or(parse_list(key, value)?)),
            op if op.starts_with('$') => {
                return Err(Error::filter(format!("unknown top-level operator '{op}'")));
            }
            field => parse_field(field, value)?,
        };
        filter = filter.and(clause);
    }
    Ok(filter)
}

fn parse_list(op: &str, value: &JsonValue) -> Result<Vec<Filter>> {
    let JsonValue::Array(items) = value else {
        return Err(Error::filter(format!("'{op}' expects an array of filters")));
    };
    if items.is_empty() {
        return Err(Error::filter(format!("'{op}' expects at least one filter")));
    }
    items.iter().map(Filter::from_json).collect()
}

fn parse_field(field: &str, value: &JsonValue) -> Result<Filter> {
    if field.is_empty() {
        return Err(Error::filter("field name cannot be empty"));
    }

    match value {
        JsonValue::Object(map) if is_operator_document(map) => {
            let mut filter = Filter::All;
            for (op, operand) in map {
                filter = filter.and(parse_operator(field, op, operand)?);
            }
            Ok(filter)
        }
        other => Ok(Filter::eq(field, Scalar::from_json(other)?)),
    }
}

/// `{"$gt": 1}` is an operator document; `{"$date": ...}` is a value
fn is_operator_document(map: &JsonObject) -> bool {
    !map.is_empty()
        && map.keys().all(|k| k.starts_with('$'))
        && !map.contains_key("$date")
        && !map.contains_key("$oid")
        && !map.contains_key("$numberDouble")
}

fn parse_operator(field: &str, op: &str, operand: &JsonValue) -> Result<Filter> {
    let compare = |op: Operator| -> Result<Filter> {
        Ok(Filter::compare(field, op, Scalar::from_json(operand)?))
    };

    match op {
        "$eq" => compare(Operator::Eq),
        "$ne" => compare(Operator::Ne),
        "$gt" => compare(Operator::Gt),
        "$gte" => compare(Operator::Gte),
        "$lt" => compare(Operator::Lt),
        "$lte" => compare(Operator::Lte),
        "$in" | "$nin" => {
            let JsonValue::Array(items) = operand else {
                return Err(Error::filter(format!("'{op}' on '{field}' expects an array")));
            };
            let values = items
                .iter()
                .map(Scalar::from_json)
                .collect::<Result<Vec<_>>>()?;
            let filter = Filter::In {
                field: field.to_string(),
                values,
            };
            Ok(if op == "$nin" { Filter::not(filter) } else { filter })
        }
        "$exists" => match operand {
            JsonValue::Bool(exists) => Ok(Filter::exists(field, *exists)),
            _ => Err(Error::filter(format!(
                "'$exists' on '{field}' expects a boolean"
            ))),
        },
        "$not" => match operand {
            JsonValue::Object(map) if is_operator_document(map) => {
                parse_field(field, operand).map(Filter::not)
            }
            _ => Err(Error::filter(format!(
                "'$not' on '{field}' expects an operator document"
            ))),
        },
        other => Err(Error::filter(format!(
            "unknown operator '{other}' on field '{field}'"
        ))),
    }
}
