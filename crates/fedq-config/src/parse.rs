//! Configuration file parsing.
//!
//! Parses `fedq.toml` into `RawConfig`, which mirrors the TOML schema and keeps
//! every field optional until resolution.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// General settings section.
    pub settings: Option<RawSettings>,
    /// Entity definitions in registration order.
    pub entity: Option<Vec<RawEntity>>,
}

/// Raw general settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    /// Results per page when the caller gives no limit.
    pub default_limit: Option<usize>,
    /// Search deadline in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Raw entity definition from TOML.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEntity {
    /// Entity name, unique within the file.
    pub name: String,
    /// Marks the entity whose ids are the compound result.
    pub default: Option<bool>,
    /// JSON data file(s). Accepts a single string or an array of strings.
    #[serde(default)]
    #[serde_as(as = "OneOrMany<_>")]
    pub data: Vec<String>,
    /// Field label -> field definition.
    #[serde(default)]
    pub fields: BTreeMap<String, RawField>,
    /// Document path holding the default entity's ids.
    pub link: Option<String>,
    /// Document path holding the previous entity's ids.
    pub link_to_prev: Option<String>,
}

/// Raw field definition: a bare path, or a table with a path and a type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    /// `Label = "path"`, a string field.
    Path(String),
    /// `Label = { path = "...", type = "numeric" }`.
    Typed {
        /// Dotted document path.
        path: String,
        /// Declared type name.
        #[serde(rename = "type")]
        field_type: Option<String>,
    },
}

impl RawField {
    /// The dotted document path.
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Typed { path, .. } => path,
        }
    }

    /// The declared type name, if any.
    pub fn field_type(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Typed { field_type, .. } => field_type.as_deref(),
        }
    }
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}
