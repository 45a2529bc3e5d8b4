//! Storage-neutral filter expressions
//!
//! The planner must be able to conjoin a caller's filter with a keyset
//! bound, so filters are an expression tree rather than an opaque value.
//! Storage adapters translate the tree into their own query language, or
//! evaluate it directly with [`Filter::matches`].

use crate::types::Collation;
use crate::value::{Document, Scalar};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (`=`)
    Eq,
    /// Not equal (`!=`)
    Ne,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Gte,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Lte,
}

impl Operator {
    /// Check whether an ordering satisfies this operator
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
        }
    }

    /// Operator symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }
}

/// A filter expression over document fields
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document
    #[default]
    All,
    /// Compare a field against a value
    Compare {
        /// Field name (dot paths allowed where the store supports them)
        field: String,
        /// Comparison operator
        op: Operator,
        /// Value to compare against
        value: Scalar,
    },
    /// Field value is one of the given values
    In {
        /// Field name
        field: String,
        /// Accepted values
        values: Vec<Scalar>,
    },
    /// Field presence
    Exists {
        /// Field name
        field: String,
        /// Whether the field must be present (true) or absent (false)
        exists: bool,
    },
    /// All sub-filters match
    And(Vec<Filter>),
    /// Any sub-filter matches
    Or(Vec<Filter>),
    /// Sub-filter does not match
    Not(Box<Filter>),
}

impl Filter {
    /// Create a comparison filter
    pub fn compare(field: impl Into<String>, op: Operator, value: impl Into<Scalar>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, Operator::Eq, value)
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, Operator::Ne, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, Operator::Gt, value)
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, Operator::Gte, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, Operator::Lt, value)
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, Operator::Lte, value)
    }

    /// `field in values`
    pub fn is_in<V: Into<Scalar>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Field presence check
    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        Self::Exists {
            field: field.into(),
            exists,
        }
    }

    /// Negate a filter
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Conjoin two filters, flattening nested `And`s and dropping `All`
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        let mut parts = Vec::new();
        for filter in [self, other] {
            match filter {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }

        match parts.len() {
            0 => Filter::All,
            1 => parts.pop().unwrap_or_default(),
            _ => Filter::And(parts),
        }
    }

    /// Disjoin two filters, flattening nested `Or`s
    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        if matches!(self, Filter::All) || matches!(other, Filter::All) {
            return Filter::All;
        }

        let mut parts = Vec::new();
        for filter in [self, other] {
            match filter {
                Filter::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        Filter::Or(parts)
    }

    /// Check if this filter matches everything
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Evaluate the filter against a document.
    ///
    /// Missing fields read as null and compare using [`Scalar`] ordering,
    /// with string comparisons following the collation when one is given.
    pub fn matches<D: Document + ?Sized>(&self, doc: &D, collation: Option<&Collation>) -> bool {
        match self {
            Filter::All => true,
            Filter::Compare { field, op, value } => {
                let actual = doc.field(field).unwrap_or(Scalar::Null);
                op.accepts(actual.compare(value, collation))
            }
            Filter::In { field, values } => {
                let actual = doc.field(field).unwrap_or(Scalar::Null);
                values
                    .iter()
                    .any(|v| actual.compare(v, collation) == Ordering::Equal)
            }
            Filter::Exists { field, exists } => doc.field(field).is_some() == *exists,
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc, collation)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc, collation)),
            Filter::Not(filter) => !filter.matches(doc, collation),
        }
    }

    /// Every field name referenced by this filter
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::All => {}
            Filter::Compare { field, .. } | Filter::In { field, .. } | Filter::Exists { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Filter::And(filters) | Filter::Or(filters) => {
                for filter in filters {
                    filter.collect_fields(out);
                }
            }
            Filter::Not(filter) => filter.collect_fields(out),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "*"),
            Filter::Compare { field, op, value } => write!(f, "{field} {} {value}", op.symbol()),
            Filter::In { field, values } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{field} in [{}]", values.join(", "))
            }
            Filter::Exists { field, exists } => {
                if *exists {
                    write!(f, "exists({field})")
                } else {
                    write!(f, "!exists({field})")
                }
            }
            Filter::And(filters) => write_joined(f, filters, " AND "),
            Filter::Or(filters) => write_joined(f, filters, " OR "),
            Filter::Not(filter) => write!(f, "NOT ({filter})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, filters: &[Filter], sep: &str) -> fmt::Result {
    let parts: Vec<String> = filters.iter().map(|p| format!("({p})")).collect();
    write!(f, "{}", parts.join(sep))
}
