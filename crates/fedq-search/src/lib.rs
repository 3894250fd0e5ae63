//! Federated search for fedq.
//!
//! This crate answers one structured [`fedq_query::Query`] across several
//! backends that each hold a slice of the data:
//!
//! - **Field registries** ([`FieldRegistry`], [`OptionsMap`]) map human field
//!   labels to physical paths and decide which backend owns which field
//! - **[`Searcher`]** is the capability every backend implements
//! - **[`CompoundSearcher`]** plans, condenses, sorts and executes a query
//!   across backends, and is itself a [`Searcher`]
//! - **[`MemorySearcher`]** is an in-memory backend over JSON documents
//! - **[`sql`]** compiles queries to parameterized PostgreSQL for relational
//!   backends
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use fedq_query::Query;
//! use fedq_search::{CompoundSearcher, Context, FieldRegistry, MemorySearcher, SearcherSpec, Searcher};
//! use serde_json::json;
//!
//! let registry = Arc::new(
//!     FieldRegistry::builder("deployments")
//!         .field("Deployment", "name")
//!         .build()
//!         .unwrap(),
//! );
//! let backend = Arc::new(
//!     MemorySearcher::new(registry.clone(), vec![json!({"id": "d1", "name": "web"})]).unwrap(),
//! );
//! let searcher = CompoundSearcher::new(vec![
//!     SearcherSpec::new("deployments", backend, registry).as_default(),
//! ])
//! .unwrap();
//!
//! let results = searcher
//!     .search(&Context::background(), &Query::match_field("Deployment", "we"))
//!     .unwrap();
//! assert_eq!(results[0].id, "d1");
//! ```

#![warn(missing_docs)]

mod compound;
mod context;
mod error;
mod memory;
mod options;
mod result;
mod searcher;
pub mod sql;

pub use compound::{CompoundSearcher, Plan, RequestNode, SearcherSpec, SpecId};
pub use context::Context;
pub use error::{RegistryError, SearchError};
pub use memory::MemorySearcher;
pub use options::{CombinedOptions, DataType, FieldDescriptor, FieldRegistry, FieldRegistryBuilder, OptionsMap};
pub use result::{SearchResult, page_results, transform_results};
pub use searcher::{Searcher, Transformation};
