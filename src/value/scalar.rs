//! Comparable scalar values
//!
//! `Scalar` is the value type for paginated fields and tie-breaker ids.
//! Values of different types are ordered by type bracket first, following
//! the usual document-store comparison order:
//!
//! ```text
//! Null < numbers (Int, Float) < String < ObjectId < Bool < Timestamp
//! ```

use crate::error::{Error, Result};
use crate::types::{Collation, JsonValue};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

/// A comparable scalar value
#[derive(Debug, Clone)]
pub enum Scalar {
    /// Missing or explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// 12-byte object identifier
    ObjectId([u8; 12]),
}

impl Scalar {
    /// Type bracket used for cross-type ordering
    fn bracket(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Int(_) | Scalar::Float(_) => 1,
            Scalar::String(_) => 2,
            Scalar::ObjectId(_) => 3,
            Scalar::Bool(_) => 4,
            Scalar::Timestamp(_) => 5,
        }
    }

    /// Name of this value's type (for error messages and CLI output)
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
            Scalar::Timestamp(_) => "timestamp",
            Scalar::ObjectId(_) => "objectId",
        }
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Compare two scalars, applying collation rules to strings
    pub fn compare(&self, other: &Scalar, collation: Option<&Collation>) -> Ordering {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Ordering::Equal,
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => compare_floats(*a, *b),
            (Scalar::Int(a), Scalar::Float(b)) => compare_int_float(*a, *b),
            (Scalar::Float(a), Scalar::Int(b)) => compare_int_float(*b, *a).reverse(),
            (Scalar::String(a), Scalar::String(b)) => compare_strings(a, b, collation),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
            (Scalar::ObjectId(a), Scalar::ObjectId(b)) => a.cmp(b),
            _ => self.bracket().cmp(&other.bracket()),
        }
    }

    /// Parse a scalar from JSON.
    ///
    /// Objects are only accepted in extended JSON form:
    /// `{"$date": "<rfc3339>"}`, `{"$date": <millis>}`, `{"$oid": "<24 hex>"}`
    /// or `{"$numberDouble": "NaN" | "Infinity" | "-Infinity" | "<decimal>"}`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(Scalar::Null),
            JsonValue::Bool(b) => Ok(Scalar::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Scalar::Float(f))
                } else {
                    Err(Error::filter(format!("number {n} is out of range")))
                }
            }
            JsonValue::String(s) => Ok(Scalar::String(s.clone())),
            JsonValue::Object(map) if map.len() == 1 => {
                if let Some(date) = map.get("$date") {
                    return parse_date(date);
                }
                if let Some(JsonValue::String(hex)) = map.get("$oid") {
                    return parse_object_id(hex).map(Scalar::ObjectId);
                }
                if let Some(JsonValue::String(text)) = map.get("$numberDouble") {
                    return parse_double(text).map(Scalar::Float);
                }
                Err(Error::filter(format!("unsupported extended JSON value: {value}")))
            }
            JsonValue::Object(_) | JsonValue::Array(_) => Err(Error::filter(format!(
                "expected a scalar value, got {value}"
            ))),
        }
    }

    /// Convert to JSON, using extended JSON for timestamps, object ids and
    /// floats JSON numbers cannot hold (NaN and the infinities)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Scalar::Null => JsonValue::Null,
            Scalar::Bool(b) => JsonValue::Bool(*b),
            Scalar::Int(i) => JsonValue::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f).map_or_else(
                || serde_json::json!({ "$numberDouble": non_finite_name(*f) }),
                JsonValue::Number,
            ),
            Scalar::String(s) => JsonValue::String(s.clone()),
            Scalar::Timestamp(ts) => serde_json::json!({ "$date": ts.to_rfc3339() }),
            Scalar::ObjectId(oid) => serde_json::json!({ "$oid": hex_encode(oid) }),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, None) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other, None)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::String(s) => write!(f, "{s:?}"),
            Scalar::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Scalar::ObjectId(oid) => write!(f, "ObjectId({})", hex_encode(oid)),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(i64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(v: DateTime<Utc>) -> Self {
        Scalar::Timestamp(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map_or(Scalar::Null, Into::into)
    }
}

/// Compare floats by value; `-0.0 == 0.0`, NaN sorts past the infinities
/// on its sign side
fn compare_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Compare an integer with a float exactly, without rounding the integer
fn compare_int_float(a: i64, b: f64) -> Ordering {
    // 2^63, the first float above i64::MAX
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if b.is_nan() {
        return if b.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if b >= TWO_POW_63 {
        return Ordering::Less;
    }
    if b < -TWO_POW_63 {
        return Ordering::Greater;
    }

    let whole = b.trunc();
    let fraction = b - whole;
    a.cmp(&(whole as i64)).then_with(|| {
        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

/// Compare strings under an optional collation.
///
/// Only the parts of a collation that can be honoured without locale tables
/// are applied: case folding and numeric ordering of digit runs.
fn compare_strings(a: &str, b: &str, collation: Option<&Collation>) -> Ordering {
    let Some(collation) = collation else {
        return a.cmp(b);
    };

    let (a, b) = if collation.ignores_case() {
        (a.to_lowercase(), b.to_lowercase())
    } else {
        (a.to_string(), b.to_string())
    };

    if collation.numeric_ordering {
        compare_natural(&a, &b)
    } else {
        a.cmp(&b)
    }
}

/// Compare strings treating runs of ASCII digits as numbers
fn compare_natural(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_trim = l_run.trim_start_matches('0');
                let r_trim = r_run.trim_start_matches('0');
                let ordering = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn parse_date(value: &JsonValue) -> Result<Scalar> {
    match value {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Scalar::Timestamp(dt.with_timezone(&Utc)))
            .map_err(|e| Error::filter(format!("invalid $date '{s}': {e}"))),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(Scalar::Timestamp)
            .ok_or_else(|| Error::filter(format!("invalid $date millis: {n}"))),
        _ => Err(Error::filter(format!("invalid $date value: {value}"))),
    }
}

fn parse_double(text: &str) -> Result<f64> {
    match text {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        other => other
            .parse()
            .map_err(|e| Error::filter(format!("invalid $numberDouble '{other}': {e}"))),
    }
}

fn non_finite_name(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f.is_sign_negative() {
        "-Infinity"
    } else {
        "Infinity"
    }
}

fn parse_object_id(hex: &str) -> Result<[u8; 12]> {
    if hex.len() != 24 || !hex.is_ascii() {
        return Err(Error::filter(format!(
            "invalid $oid '{hex}': expected 24 hex characters"
        )));
    }

    let mut oid = [0u8; 12];
    for (i, byte) in oid.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|e| Error::filter(format!("invalid $oid '{hex}': {e}")))?;
    }
    Ok(oid)
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
