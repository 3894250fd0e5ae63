//! The uniform backend capability.

use std::sync::Arc;

use fedq_query::Query;

use crate::{context::Context, error::SearchError, result::SearchResult};

/// A backend that answers structured queries.
///
/// Full-text indexes, relational stores and compound searchers all implement
/// this trait, so a compound searcher can serve as one backend of another.
pub trait Searcher: Send + Sync {
    /// Returns every document matching `query`, honoring its pagination.
    fn search(&self, ctx: &Context, query: &Query) -> Result<Vec<SearchResult>, SearchError>;

    /// Returns the number of documents matching `query`.
    fn count(&self, ctx: &Context, query: &Query) -> Result<usize, SearchError>;
}

/// Maps one identifier to zero or more identifiers of a related entity.
///
/// Must be pure from the engine's point of view.
pub type Transformation = Arc<dyn Fn(&Context, &str) -> Vec<String> + Send + Sync>;
