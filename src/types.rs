//! Common types used throughout cursor-pager
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Sort Direction
// ============================================================================

/// Sort direction for the paginated field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order (smallest first)
    #[default]
    Ascending,
    /// Descending order (largest first)
    Descending,
}

impl SortDirection {
    /// Build a direction from an "ascending" flag
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    /// Return the opposite sort direction
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Check if this is ascending
    pub fn is_ascending(self) -> bool {
        matches!(self, Self::Ascending)
    }

    /// Apply this direction to an ascending comparison result
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

// ============================================================================
// Collation
// ============================================================================

/// Locale-aware comparison rules for string sorting.
///
/// The pagination engine never interprets a collation; it hands it to the
/// storage collaborator untouched. Field names mirror the document-store
/// options most drivers expose.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collation {
    /// ICU locale (e.g., "en", "fr_CA")
    pub locale: String,

    /// Comparison strength (1 = base letters only, 2 = accents, 3 = case)
    #[serde(default)]
    pub strength: Option<u8>,

    /// Whether case is considered at strength 1 and 2
    #[serde(default)]
    pub case_level: bool,

    /// Compare digit runs as numbers ("10" after "9")
    #[serde(default)]
    pub numeric_ordering: bool,
}

impl Collation {
    /// Create a collation for a locale with default rules
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Default::default()
        }
    }

    /// Set comparison strength
    #[must_use]
    pub fn with_strength(mut self, strength: u8) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Enable numeric ordering
    #[must_use]
    pub fn with_numeric_ordering(mut self, enabled: bool) -> Self {
        self.numeric_ordering = enabled;
        self
    }

    /// Whether letter case is ignored when comparing strings
    pub fn ignores_case(&self) -> bool {
        !self.case_level && self.strength.is_some_and(|s| s <= 2)
    }

    /// Whether accents are ignored when comparing strings
    pub fn ignores_accents(&self) -> bool {
        self.strength == Some(1)
    }
}
