//! Paginator configuration
//!
//! Settings that stay fixed across page requests. Loaded from YAML (or
//! JSON, which YAML accepts) or built in code.
//!
//! ```yaml
//! id_field: _id
//! default_limit: 20
//! max_limit: 500
//! max_cursor_bytes: 4096
//! count_total: false
//! ```

use crate::cursor::DEFAULT_MAX_CURSOR_BYTES;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Paginator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginatorConfig {
    /// Unique field used to break ties between equal values
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Page size when a request does not give one
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Largest page size a request may ask for
    #[serde(default)]
    pub max_limit: Option<u32>,

    /// Longest cursor string accepted for decoding
    #[serde(default = "default_max_cursor_bytes")]
    pub max_cursor_bytes: usize,

    /// Whether requests count the total by default
    #[serde(default)]
    pub count_total: bool,
}

fn default_id_field() -> String {
    "_id".to_string()
}

fn default_limit() -> u32 {
    20
}

fn default_max_cursor_bytes() -> usize {
    DEFAULT_MAX_CURSOR_BYTES
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            default_limit: default_limit(),
            max_limit: None,
            max_cursor_bytes: default_max_cursor_bytes(),
            count_total: false,
        }
    }
}

impl PaginatorConfig {
    /// Load configuration from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.id_field.trim().is_empty() {
            return Err(Error::config("id_field cannot be empty"));
        }
        if self.default_limit == 0 {
            return Err(Error::config("default_limit must be at least 1"));
        }
        if let Some(max) = self.max_limit {
            if max == 0 {
                return Err(Error::config("max_limit must be at least 1"));
            }
            if self.default_limit > max {
                return Err(Error::config(format!(
                    "default_limit ({}) exceeds max_limit ({max})",
                    self.default_limit
                )));
            }
        }
        if self.max_cursor_bytes == 0 {
            return Err(Error::config("max_cursor_bytes must be at least 1"));
        }
        Ok(())
    }

    /// Set the tie-breaker id field
    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Set the default page size
    #[must_use]
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the maximum page size
    #[must_use]
    pub fn with_max_limit(mut self, limit: u32) -> Self {
        self.max_limit = Some(limit);
        self
    }

    /// Set the maximum accepted cursor length
    #[must_use]
    pub fn with_max_cursor_bytes(mut self, bytes: usize) -> Self {
        self.max_cursor_bytes = bytes;
        self
    }

    /// Count totals by default
    #[must_use]
    pub fn with_count_total(mut self, count_total: bool) -> Self {
        self.count_total = count_total;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PaginatorConfig::default();
        assert_eq!(config.id_field, "_id");
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.max_limit, None);
        assert_eq!(config.max_cursor_bytes, 4096);
        assert!(!config.count_total);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_str() {
        let config = PaginatorConfig::from_yaml_str(
            r"
id_field: id
default_limit: 50
max_limit: 200
count_total: true
",
        )
        .unwrap();

        assert_eq!(
            config,
            PaginatorConfig::default()
                .with_id_field("id")
                .with_default_limit(50)
                .with_max_limit(200)
                .with_count_total(true)
        );
    }

    #[test]
    fn test_from_yaml_str_accepts_json() {
        let config = PaginatorConfig::from_yaml_str(r#"{"max_cursor_bytes": 1024}"#).unwrap();
        assert_eq!(config.max_cursor_bytes, 1024);
        assert_eq!(config.id_field, "_id");
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = PaginatorConfig::from_yaml_str("page_size: 10").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_validate() {
        let err = PaginatorConfig::default()
            .with_id_field("")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("id_field"));

        let err = PaginatorConfig::default()
            .with_default_limit(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("default_limit"));

        let err = PaginatorConfig::default()
            .with_default_limit(50)
            .with_max_limit(10)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("exceeds max_limit"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_limit: 5").unwrap();

        let config = PaginatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_limit, 5);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = PaginatorConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
