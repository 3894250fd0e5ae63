//! fedq: federated structured search.
//!
//! fedq answers one structured query across several entity backends, each
//! holding a slice of the data: deployments in one store, the images they
//! run in another. A `fedq.toml` catalog names the entities, the field labels
//! each one answers, and how ids in one entity link to the default entity.
//! Queries like `Image:nginx+Namespace:prod` are planned per entity, merged,
//! and answered in the default entity's id space.

#![warn(missing_docs)]

pub mod cli;
