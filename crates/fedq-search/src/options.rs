//! Field registries: mapping human field labels to physical field paths.
//!
//! Every backend owns an [`OptionsMap`] describing the labels it can answer.
//! Registries are built once at startup with [`FieldRegistry::builder`] and
//! never mutated afterwards.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// The value type stored under a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Text, matched case-insensitively.
    #[default]
    String,
    /// Numbers, compared numerically.
    Numeric,
    /// `true` / `false`.
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Where a labelled field lives in a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Label as registered (original casing).
    pub label: String,
    /// Physical path: a dotted document path or a column.
    pub path: String,
    /// Entity category (table) owning the field.
    pub category: String,
    /// Stored value type.
    pub data_type: DataType,
}

/// Label lookup for one backend.
pub trait OptionsMap: Send + Sync + fmt::Debug {
    /// Looks up a label, case-insensitively.
    fn get(&self, label: &str) -> Option<&FieldDescriptor>;

    /// Registered labels in a stable order.
    fn labels(&self) -> Vec<&str>;

    /// True when every label resolves.
    fn contains_all(&self, labels: &[&str]) -> bool {
        labels.iter().all(|l| self.get(l).is_some())
    }

    /// True when at least one label resolves.
    fn contains_any(&self, labels: &[&str]) -> bool {
        labels.iter().any(|l| self.get(l).is_some())
    }
}

/// An immutable label registry for one entity category.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    /// Entity category.
    category: String,
    /// Lower-cased label to descriptor.
    fields: BTreeMap<String, FieldDescriptor>,
}

impl FieldRegistry {
    /// Starts a registry for `category`.
    pub fn builder(category: impl Into<String>) -> FieldRegistryBuilder {
        FieldRegistryBuilder {
            category: category.into(),
            fields: Vec::new(),
        }
    }

    /// The entity category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the descriptors in label order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }
}

impl OptionsMap for FieldRegistry {
    fn get(&self, label: &str) -> Option<&FieldDescriptor> {
        self.fields.get(&label.to_lowercase())
    }

    fn labels(&self) -> Vec<&str> {
        self.fields.values().map(|f| f.label.as_str()).collect()
    }
}

/// Accumulates fields for a [`FieldRegistry`].
#[derive(Debug, Clone)]
pub struct FieldRegistryBuilder {
    /// Entity category.
    category: String,
    /// Fields in insertion order.
    fields: Vec<FieldDescriptor>,
}

impl FieldRegistryBuilder {
    /// Adds a string field.
    pub fn field(self, label: impl Into<String>, path: impl Into<String>) -> Self {
        self.typed_field(label, path, DataType::String)
    }

    /// Adds a field with an explicit type.
    pub fn typed_field(
        mut self,
        label: impl Into<String>,
        path: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            label: label.into(),
            path: path.into(),
            category: self.category.clone(),
            data_type,
        });
        self
    }

    /// Validates and freezes the registry.
    pub fn build(self) -> Result<FieldRegistry, RegistryError> {
        let mut fields = BTreeMap::new();
        for field in self.fields {
            if field.label.trim().is_empty() || field.path.trim().is_empty() {
                return Err(RegistryError::EmptyField {
                    category: self.category,
                });
            }
            let key = field.label.to_lowercase();
            if fields.contains_key(&key) {
                return Err(RegistryError::DuplicateLabel {
                    category: self.category,
                    label: field.label,
                });
            }
            fields.insert(key, field);
        }
        Ok(FieldRegistry {
            category: self.category,
            fields,
        })
    }
}

/// Ordered union of several registries; earlier maps win on shared labels.
#[derive(Debug, Clone, Default)]
pub struct CombinedOptions {
    /// Member maps in priority order.
    maps: Vec<Arc<dyn OptionsMap>>,
}

impl CombinedOptions {
    /// Combines `maps`, first one taking precedence.
    pub fn new(maps: Vec<Arc<dyn OptionsMap>>) -> Self {
        Self { maps }
    }
}

impl OptionsMap for CombinedOptions {
    fn get(&self, label: &str) -> Option<&FieldDescriptor> {
        self.maps.iter().find_map(|m| m.get(label))
    }

    fn labels(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for map in &self.maps {
            for label in map.labels() {
                if !seen.iter().any(|s: &&str| s.eq_ignore_ascii_case(label)) {
                    seen.push(label);
                }
            }
        }
        seen
    }
}
