//! Catalog configuration for fedq.
//!
//! A catalog is a TOML file named `fedq.toml` describing the entities fedq
//! federates over: where each entity's documents live, which field labels it
//! registers, and how its ids link back to the default entity. The file is
//! found by walking up from the working directory, falling back to
//! `~/.fedq.toml`.
//!
//! ```toml
//! [[entity]]
//! name = "deployments"
//! default = true
//! data = "deployments.json"
//! [entity.fields]
//! Deployment = "name"
//! "Replica Count" = { path = "replicas", type = "numeric" }
//! ```

#![warn(missing_docs)]

mod discovery;
mod error;
mod parse;
mod resolve;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    fmt,
    path::{Path, PathBuf},
};

pub use discovery::{
    CONFIG_FILENAME, GLOBAL_CONFIG_FILENAME, discover_config_file, global_config_path,
    is_global_config,
};
pub use error::ConfigError;
pub use parse::{RawConfig, RawEntity, RawField, RawSettings, parse_config_file, parse_config_str};
use resolve::resolve_config;
pub use resolve::resolve_data_path;
use serde::Serialize;
pub use validate::ConfigWarning;
use validate::validate_config;

/// A resolved catalog configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// General settings.
    pub settings: Settings,
    /// Entities in registration order.
    pub entities: Vec<Entity>,
    /// The file this configuration was loaded from.
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration governing `cwd`.
    ///
    /// Returns `ConfigError::NotFound` when no `fedq.toml` exists in `cwd`, its
    /// ancestors, or the home directory.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let path = discover_config_file(cwd).ok_or_else(|| ConfigError::NotFound {
            start: cwd.to_path_buf(),
        })?;
        Self::load_file(&path)
    }

    /// Loads configuration from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_file(path)?;
        resolve_config(raw, path)
    }

    /// Parses configuration from a TOML string as if it were read from `path`.
    ///
    /// Relative data paths resolve against `path`'s directory.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_str(contents, path)?;
        resolve_config(raw, path)
    }

    /// Looks up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// The entity marked default, if any.
    pub fn default_entity(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_default)
    }

    /// Validates the configuration and returns any warnings.
    ///
    /// This checks for:
    /// - A missing default entity
    /// - `link_to_prev` on the first entity
    /// - Entities without fields, links, or data files
    /// - Data files that don't exist
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective settings to TOML format.
    pub fn settings_to_toml(&self) -> Result<String, toml::ser::Error> {
        /// Wrapper producing a `[settings]` table.
        #[derive(Serialize)]
        struct SettingsTable<'a> {
            /// General settings.
            settings: &'a Settings,
        }

        toml::to_string_pretty(&SettingsTable {
            settings: &self.settings,
        })
    }
}

/// General settings for fedq.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Results per page when the caller gives no limit.
    pub default_limit: usize,
    /// Search deadline in milliseconds; no deadline when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_limit: 20,
            timeout_ms: None,
        }
    }
}

/// One federated entity: a backend over a set of JSON documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Entity name, used as the backend's name and field category.
    pub name: String,
    /// Whether this entity's ids are the compound result.
    pub is_default: bool,
    /// Resolved data file paths.
    pub data: Vec<PathBuf>,
    /// Registered fields.
    pub fields: Vec<FieldSpec>,
    /// Document path holding the default entity's ids.
    pub link: Option<String>,
    /// Document path holding the previous entity's ids.
    pub link_to_prev: Option<String>,
}

/// A field registered by an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Query label, e.g. `Image Tag`.
    pub label: String,
    /// Dotted document path.
    pub path: String,
    /// Value type.
    pub field_type: FieldType,
}

/// The value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    /// Case-insensitive text.
    #[default]
    String,
    /// Numbers, compared numerically.
    Numeric,
    /// `true` or `false`.
    Boolean,
}

impl FieldType {
    /// Parses a type name as written in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Some(Self::String),
            "numeric" | "number" => Some(Self::Numeric),
            "boolean" | "bool" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestCatalog;

    const CATALOG: &str = r#"
[[entity]]
name = "deployments"
default = true
data = "deployments.json"
fields = { Deployment = "name" }

[[entity]]
name = "images"
data = "images.json"
link = "deployment_ids"
fields = { Image = "name" }
"#;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_limit, 20);
        assert!(settings.timeout_ms.is_none());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.entities.is_empty());
        assert!(config.config_path.is_none());
        assert!(config.default_entity().is_none());
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::from_name("Numeric"), Some(FieldType::Numeric));
        assert_eq!(FieldType::from_name("bool"), Some(FieldType::Boolean));
        assert_eq!(FieldType::from_name("string"), Some(FieldType::String));
        assert_eq!(FieldType::from_name("date"), None);
        assert_eq!(FieldType::Numeric.to_string(), "numeric");
    }

    #[test]
    fn test_load_discovers_config() {
        let dir = TestCatalog::new();
        let path = dir.config("catalog", CATALOG);
        let cwd = dir.dir("catalog/sub");

        let config = Config::load(&cwd).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.default_entity().unwrap().name, "deployments");
        let images = config.entity("images").unwrap();
        assert_eq!(images.data, vec![dir.path().join("catalog").join("images.json")]);
        assert!(config.entity("pods").is_none());
    }

    #[test]
    fn test_generated_catalog_validates_clean() {
        let dir = TestCatalog::new();
        let path = dir.catalog("catalog", &["deployments", "images", "components"]);

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.entities.len(), 3);
        assert_eq!(config.default_entity().unwrap().name, "deployments");
        assert_eq!(config.entity("images").unwrap().link.as_deref(), Some("parent_ids"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_load_file_missing() {
        let err = Config::load_file(Path::new("/nonexistent/fedq.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_settings_to_toml() {
        let mut config = Config::from_toml(CATALOG, Path::new("/c/fedq.toml")).unwrap();
        let toml = config.settings_to_toml().unwrap();
        assert!(toml.contains("[settings]"));
        assert!(toml.contains("default_limit = 20"));
        assert!(!toml.contains("timeout_ms"));

        config.settings.timeout_ms = Some(500);
        let toml = config.settings_to_toml().unwrap();
        assert!(toml.contains("timeout_ms = 500"));
        let parsed: toml::Value = toml::from_str(&toml).unwrap();
        assert!(parsed.get("settings").is_some());
    }
}
