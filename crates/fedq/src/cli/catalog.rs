//! Backends built from the configured entities.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use fedq_config::{Config, Entity, FieldType};
use fedq_search::{
    CompoundSearcher, DataType, FieldRegistry, MemorySearcher, RegistryError, SearchError,
    SearcherSpec,
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading entity data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A data file could not be read.
    #[error("failed to read data file {path}: {source}")]
    ReadData {
        /// The data file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A data file is not valid JSON.
    #[error("failed to parse data file {path}: {source}")]
    ParseData {
        /// The data file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A data file holds something other than an array or object.
    #[error("data file {path} must hold a JSON array of documents")]
    NotDocuments {
        /// The data file.
        path: PathBuf,
    },

    /// An entity's fields are inconsistent.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The backends could not be assembled.
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// One entity's loaded backend.
#[derive(Debug, Clone)]
pub struct Backend {
    /// Entity name.
    pub name: String,
    /// Field labels the entity answers.
    pub registry: Arc<FieldRegistry>,
    /// The in-memory searcher.
    pub searcher: Arc<MemorySearcher>,
}

/// All configured entities, loaded.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Backends in registration order.
    pub backends: Vec<Backend>,
    /// The federated searcher over every backend.
    pub searcher: CompoundSearcher,
}

impl Catalog {
    /// Loads every entity's data and assembles the compound searcher.
    pub fn load(config: &Config) -> Result<Self, CatalogError> {
        let backends = config
            .entities
            .iter()
            .map(load_backend)
            .collect::<Result<Vec<_>, _>>()?;

        let specs = config
            .entities
            .iter()
            .zip(&backends)
            .map(|(entity, backend)| searcher_spec(entity, backend))
            .collect();

        Ok(Self {
            searcher: CompoundSearcher::new(specs)?,
            backends,
        })
    }

    /// Looks up a backend by entity name.
    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }
}

/// Builds the field registry for `entity`.
pub fn registry_for(entity: &Entity) -> Result<FieldRegistry, RegistryError> {
    entity
        .fields
        .iter()
        .fold(FieldRegistry::builder(&entity.name), |builder, field| {
            builder.typed_field(&field.label, &field.path, data_type(field.field_type))
        })
        .build()
}

/// Maps a configured field type to the search type.
fn data_type(field_type: FieldType) -> DataType {
    match field_type {
        FieldType::String => DataType::String,
        FieldType::Numeric => DataType::Numeric,
        FieldType::Boolean => DataType::Boolean,
    }
}

/// Loads one entity's documents into a memory backend.
fn load_backend(entity: &Entity) -> Result<Backend, CatalogError> {
    let registry = Arc::new(registry_for(entity)?);
    let mut documents = Vec::new();
    for path in &entity.data {
        documents.extend(read_documents(path)?);
    }
    debug!(
        entity = %entity.name,
        documents = documents.len(),
        fields = registry.len(),
        "loaded entity"
    );
    let searcher = MemorySearcher::new(Arc::clone(&registry), documents)?;
    Ok(Backend {
        name: entity.name.clone(),
        registry,
        searcher: Arc::new(searcher),
    })
}

/// Reads a JSON array of documents, or a single document.
fn read_documents(path: &Path) -> Result<Vec<Value>, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::ReadData {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&contents).map_err(|source| CatalogError::ParseData {
            path: path.to_path_buf(),
            source,
        })?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![value]),
        _ => Err(CatalogError::NotDocuments {
            path: path.to_path_buf(),
        }),
    }
}

/// Registers `backend` with the compound searcher per `entity`'s topology.
fn searcher_spec(entity: &Entity, backend: &Backend) -> SearcherSpec {
    let mut spec = SearcherSpec::new(
        &entity.name,
        Arc::clone(&backend.searcher) as _,
        Arc::clone(&backend.registry) as _,
    );
    if entity.is_default {
        spec = spec.as_default();
    }
    if let Some(link) = &entity.link {
        spec = spec.with_transformation(backend.searcher.link_transformation(link));
    }
    if let Some(link) = &entity.link_to_prev {
        spec = spec.with_link_to_prev(backend.searcher.link_transformation(link));
    }
    spec
}
