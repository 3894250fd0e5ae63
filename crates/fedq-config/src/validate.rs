//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for potential issues.

use std::fmt;

use crate::{Config, Entity};

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No entity is marked default; queries on unregistered fields will fail.
    NoDefaultEntity,
    /// The first entity declares a link it can never use.
    LinkOnFirstEntity {
        /// Name of the entity.
        entity: String,
    },
    /// An entity registers no fields.
    NoFields {
        /// Name of the entity.
        entity: String,
    },
    /// An entity lists no data files.
    NoData {
        /// Name of the entity.
        entity: String,
    },
    /// A data file does not exist.
    DataFileMissing {
        /// Name of the entity.
        entity: String,
        /// Path that doesn't exist.
        path: String,
    },
    /// A non-default entity has no link into the default entity's ids.
    Unlinked {
        /// Name of the entity.
        entity: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDefaultEntity => write!(f, "no entity is marked default"),
            Self::LinkOnFirstEntity { entity } => {
                write!(f, "entity '{entity}' is first but declares link_to_prev")
            }
            Self::NoFields { entity } => write!(f, "entity '{entity}' registers no fields"),
            Self::NoData { entity } => write!(f, "entity '{entity}' lists no data files"),
            Self::DataFileMissing { entity, path } => {
                write!(f, "entity '{entity}' data file does not exist: {path}")
            }
            Self::Unlinked { entity } => write!(
                f,
                "entity '{entity}' is not default and has no link; its ids are returned unchanged"
            ),
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if !config.entities.iter().any(|e| e.is_default) {
        warnings.push(ConfigWarning::NoDefaultEntity);
    }

    if let Some(first) = config.entities.first()
        && first.link_to_prev.is_some()
    {
        warnings.push(ConfigWarning::LinkOnFirstEntity {
            entity: first.name.clone(),
        });
    }

    for entity in &config.entities {
        warnings.extend(validate_entity(entity));
    }

    warnings
}

/// Validates a single entity's fields, link, and data files.
fn validate_entity(entity: &Entity) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if entity.fields.is_empty() {
        warnings.push(ConfigWarning::NoFields {
            entity: entity.name.clone(),
        });
    }

    if !entity.is_default && entity.link.is_none() {
        warnings.push(ConfigWarning::Unlinked {
            entity: entity.name.clone(),
        });
    }

    if entity.data.is_empty() {
        warnings.push(ConfigWarning::NoData {
            entity: entity.name.clone(),
        });
    }

    for path in &entity.data {
        if !path.is_file() {
            warnings.push(ConfigWarning::DataFileMissing {
                entity: entity.name.clone(),
                path: path.display().to_string(),
            });
        }
    }

    warnings
}
