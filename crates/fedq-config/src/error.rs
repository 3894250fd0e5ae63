//! Error types for fedq configuration.

use std::{io, path::PathBuf};

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// No configuration file was found.
    #[error("no fedq.toml found in {start} or any parent directory")]
    NotFound {
        /// Directory the search started from.
        start: PathBuf,
    },

    /// The configuration defines no entities.
    #[error("no entities defined in {path}")]
    NoEntities {
        /// The configuration file.
        path: PathBuf,
    },

    /// Two entities share a name.
    #[error("duplicate entity name: {name}")]
    DuplicateEntity {
        /// The repeated name.
        name: String,
    },

    /// More than one entity is marked default.
    #[error("more than one default entity: {}", .names.join(", "))]
    MultipleDefaults {
        /// Names of the default entities.
        names: Vec<String>,
    },

    /// A field declares an unknown type.
    #[error("entity '{entity}' field '{field}' has unknown type '{value}' (expected string, numeric or boolean)")]
    InvalidFieldType {
        /// Entity name.
        entity: String,
        /// Field label.
        field: String,
        /// The declared type.
        value: String,
    },

    /// A field has an empty path.
    #[error("entity '{entity}' field '{field}' has an empty path")]
    EmptyFieldPath {
        /// Entity name.
        entity: String,
        /// Field label.
        field: String,
    },

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}
