//! Persisted configuration for RupForge plausibility filters.
//!
//! A [`PlausibilityConfig`] lists filters in the `{ class, value }` form and
//! loads from JSON, TOML or YAML. Collaborators are never persisted; they are
//! re-attached when runtime filters are initialized.
//!
//! # Examples
//!
//! ```
//! use rupforge_config::{FilterConfig, PlausibilityConfig};
//!
//! let config = PlausibilityConfig::from_json_str(r#"{
//!     "max_num_splays": 0,
//!     "filters": [
//!         { "class": "JumpDistFilter", "value": { "max_dist": 5.0 } },
//!         { "class": "GapWithinSectFilter" }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config.filters.len(), 2);
//! assert!(matches!(config.filters[1], FilterConfig::GapWithinSectFilter));
//! ```
//!
//! The same document as TOML:
//!
//! ```
//! use rupforge_config::PlausibilityConfig;
//!
//! let config = PlausibilityConfig::from_toml_str(r#"
//!     max_num_splays = 1
//!
//!     [[filters]]
//!     class = "NumClustersFilter"
//!     value = { max_num_clusters = 3 }
//! "#).unwrap();
//!
//! assert_eq!(config.max_num_splays, 1);
//! ```

mod builder;
mod filter;
pub mod validate;


use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use builder::PlausibilityConfigBuilder;
pub use filter::*;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// An ordered list of filters plus the splay allowance of the search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PlausibilityConfig {
    /// Maximum splays a rupture may carry. Directional filters are retried
    /// over alternative orderings when this is non-zero.
    #[serde(default)]
    pub max_num_splays: usize,

    /// Filters, evaluated in order.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

impl PlausibilityConfig {
    pub fn new(max_num_splays: usize) -> Self {
        Self {
            max_num_splays,
            filters: Vec::new(),
        }
    }

    /// Loads configuration from a file, choosing the format by extension
    /// (`.json`, `.yaml`/`.yml`, otherwise TOML).
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, fails to parse, or holds an
    /// invalid parameter.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses and validates configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Checks every filter's parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for filter in &self.filters {
            filter.validate()?;
        }
        Ok(())
    }

    /// Adds a filter.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filters.push(filter);
        self
    }
}
