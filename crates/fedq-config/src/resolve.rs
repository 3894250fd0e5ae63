//! Resolution of raw configuration into a `Config`.
//!
//! Checks entity topology, types each field, and resolves data paths against
//! the directory holding the config file.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use directories::BaseDirs;

use crate::{
    Config, ConfigError, Entity, FieldSpec, FieldType, Settings,
    parse::{RawConfig, RawEntity},
};

/// Resolves a data path to an absolute path.
///
/// Handles three cases:
/// - Tilde paths (`~/data.json`) - expanded to home directory
/// - Relative paths (`./data.json`, `../shared.json`) - resolved relative to `config_dir`
/// - Absolute paths - returned as-is
///
/// The file is not required to exist; `Config::validate` reports missing files.
pub fn resolve_data_path(path: &str, config_dir: &Path) -> Result<PathBuf, ConfigError> {
    let expanded = expand_tilde(path)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(config_dir.join(expanded))
    }
}

/// Expands a tilde prefix to the home directory.
fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    if path == "~" {
        return home_dir();
    }

    if let Some(rest) = path.strip_prefix("~/") {
        let home = home_dir()?;
        return Ok(home.join(rest));
    }

    Ok(PathBuf::from(path))
}

/// Returns the home directory.
fn home_dir() -> Result<PathBuf, ConfigError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Builds a `Config` from a parsed file located at `path`.
pub(crate) fn resolve_config(raw: RawConfig, path: &Path) -> Result<Config, ConfigError> {
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let raw_entities = raw.entity.unwrap_or_default();
    if raw_entities.is_empty() {
        return Err(ConfigError::NoEntities {
            path: path.to_path_buf(),
        });
    }

    let mut seen = HashSet::new();
    for entity in &raw_entities {
        if !seen.insert(entity.name.as_str()) {
            return Err(ConfigError::DuplicateEntity {
                name: entity.name.clone(),
            });
        }
    }

    let defaults: Vec<String> = raw_entities
        .iter()
        .filter(|e| e.default == Some(true))
        .map(|e| e.name.clone())
        .collect();
    if defaults.len() > 1 {
        return Err(ConfigError::MultipleDefaults { names: defaults });
    }

    let entities = raw_entities
        .into_iter()
        .map(|raw| resolve_entity(raw, config_dir))
        .collect::<Result<Vec<_>, _>>()?;

    let defaults = Settings::default();
    let settings = raw.settings.map_or(defaults.clone(), |s| Settings {
        default_limit: s.default_limit.unwrap_or(defaults.default_limit),
        timeout_ms: s.timeout_ms.or(defaults.timeout_ms),
    });

    Ok(Config {
        settings,
        entities,
        config_path: Some(path.to_path_buf()),
    })
}

/// Resolves one entity's fields and data paths.
fn resolve_entity(raw: RawEntity, config_dir: &Path) -> Result<Entity, ConfigError> {
    let mut fields = Vec::with_capacity(raw.fields.len());
    for (label, field) in &raw.fields {
        if field.path().trim().is_empty() {
            return Err(ConfigError::EmptyFieldPath {
                entity: raw.name.clone(),
                field: label.clone(),
            });
        }
        let field_type = match field.field_type() {
            None => FieldType::String,
            Some(name) => {
                FieldType::from_name(name).ok_or_else(|| ConfigError::InvalidFieldType {
                    entity: raw.name.clone(),
                    field: label.clone(),
                    value: name.to_string(),
                })?
            }
        };
        fields.push(FieldSpec {
            label: label.clone(),
            path: field.path().to_string(),
            field_type,
        });
    }

    let data = raw
        .data
        .iter()
        .map(|p| resolve_data_path(p, config_dir))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Entity {
        name: raw.name,
        is_default: raw.default.unwrap_or(false),
        data,
        fields,
        link: raw.link,
        link_to_prev: raw.link_to_prev,
    })
}
