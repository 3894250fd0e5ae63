//! Federated search over several backends.
//!
//! A [`CompoundSearcher`] answers one structured query by splitting it across
//! backends, each described by a [`SearcherSpec`]. A search runs in phases:
//!
//! 1. **build**: route every base predicate to the first backend whose field
//!    registry knows its field, producing a [`RequestNode`] tree
//! 2. **condense**: merge sibling leaves that target the same backend so each
//!    backend is called as few times as possible
//! 3. **sort**: attach the sort keys to a leaf able to sort, or add an
//!    ordering-only leaf joined on the right
//! 4. **execute**: run the leaves, remap ids through transformations and
//!    combine the sets with intersection, union and difference
//! 5. **page**: apply offset and limit once, at the top
//!
//! The compound searcher itself implements [`Searcher`], so it can be nested
//! as a backend of another compound searcher. That is how linked-field
//! predicates spanning several backends are answered.

mod build;
mod condense;
mod execute;
mod result_set;
mod sorting;
#[cfg(test)]
mod tests;
mod tree;

use std::{fmt, sync::Arc, time::Instant};

use fedq_query::Query;
use tracing::debug;

pub use tree::{RequestNode, SpecId};

use crate::{
    context::Context,
    error::SearchError,
    options::OptionsMap,
    result::{SearchResult, page_results},
    searcher::{Searcher, Transformation},
};

/// One backend registered with a compound searcher.
#[derive(Clone)]
pub struct SearcherSpec {
    /// Name used in logs and plans.
    pub name: String,
    /// Whether this backend receives queries no other backend can place.
    pub is_default: bool,
    /// The backend.
    pub searcher: Arc<dyn Searcher>,
    /// Field labels the backend answers.
    pub options: Arc<dyn OptionsMap>,
    /// Maps the backend's result ids into the compound's id space.
    pub transformation: Option<Transformation>,
    /// Maps this backend's ids into the previous backend's id space, for
    /// linked-field chains.
    pub link_to_prev: Option<Transformation>,
}

impl SearcherSpec {
    /// A non-default backend without transformations.
    pub fn new(
        name: impl Into<String>,
        searcher: Arc<dyn Searcher>,
        options: Arc<dyn OptionsMap>,
    ) -> Self {
        Self {
            name: name.into(),
            is_default: false,
            searcher,
            options,
            transformation: None,
            link_to_prev: None,
        }
    }

    /// Marks the backend as default.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Sets the result transformation.
    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = Some(transformation);
        self
    }

    /// Sets the link to the previous backend.
    pub fn with_link_to_prev(mut self, link: Transformation) -> Self {
        self.link_to_prev = Some(link);
        self
    }
}

impl fmt::Debug for SearcherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearcherSpec")
            .field("name", &self.name)
            .field("is_default", &self.is_default)
            .field("options", &self.options)
            .field("transformation", &self.transformation.is_some())
            .field("link_to_prev", &self.link_to_prev.is_some())
            .finish()
    }
}

/// The specs visible to one request: the registered ones, followed by any
/// synthesized while planning.
#[derive(Debug, Clone)]
pub(crate) struct SpecTable {
    specs: Vec<Arc<SearcherSpec>>,
    registered: usize,
}

impl SpecTable {
    fn new(specs: &[Arc<SearcherSpec>]) -> Self {
        Self {
            specs: specs.to_vec(),
            registered: specs.len(),
        }
    }

    pub(crate) fn get(&self, id: SpecId) -> &SearcherSpec {
        &self.specs[id.0]
    }

    pub(crate) fn first(&self) -> SpecId {
        SpecId(0)
    }

    pub(crate) fn registered_len(&self) -> usize {
        self.registered
    }

    pub(crate) fn registered_specs(&self) -> &[Arc<SearcherSpec>] {
        &self.specs[..self.registered]
    }

    /// Registered specs in priority order.
    pub(crate) fn registered(&self) -> impl Iterator<Item = (SpecId, &SearcherSpec)> {
        self.registered_specs()
            .iter()
            .enumerate()
            .map(|(i, spec)| (SpecId(i), spec.as_ref()))
    }

    pub(crate) fn default_id(&self) -> Option<SpecId> {
        self.registered()
            .find(|(_, spec)| spec.is_default)
            .map(|(id, _)| id)
    }

    pub(crate) fn push(&mut self, spec: SearcherSpec) -> SpecId {
        self.specs.push(Arc::new(spec));
        SpecId(self.specs.len() - 1)
    }
}

/// A searcher that federates a query across several backends.
#[derive(Debug, Clone)]
pub struct CompoundSearcher {
    specs: Vec<Arc<SearcherSpec>>,
}

impl CompoundSearcher {
    /// Creates a compound searcher over `specs`, in priority order.
    ///
    /// Fails when `specs` is empty or more than one spec is marked default.
    pub fn new(specs: Vec<SearcherSpec>) -> Result<Self, SearchError> {
        if specs.is_empty() {
            return Err(SearchError::NoSearcherSpecs);
        }
        let defaults = specs.iter().filter(|s| s.is_default).count();
        if defaults > 1 {
            return Err(SearchError::MultipleDefaultSpecs(defaults));
        }
        Ok(Self {
            specs: specs.into_iter().map(Arc::new).collect(),
        })
    }

    /// Registered specs in priority order.
    pub fn specs(&self) -> impl Iterator<Item = &SearcherSpec> {
        self.specs.iter().map(AsRef::as_ref)
    }

    /// Plans `query` without executing it.
    pub fn plan(&self, query: &Query) -> Result<Plan, SearchError> {
        let mut table = SpecTable::new(&self.specs);
        let built = build::build(&query.clone().without_pagination(), &mut table)?;
        let condensed = built.clone().map(condense::condense).transpose()?;
        let rooted = match condensed.clone() {
            Some(node) => node,
            None => match_all(&table)?,
        };
        let executable = sorting::add_sorting(rooted, query.pagination.as_ref(), &table)?;
        Ok(Plan {
            built,
            condensed,
            executable,
            specs: table,
        })
    }
}

/// Root node for a query that constrains nothing.
fn match_all(table: &SpecTable) -> Result<RequestNode, SearchError> {
    let id = table
        .default_id()
        .ok_or_else(|| SearchError::NoDefaultSpec("an unconstrained query".into()))?;
    Ok(RequestNode::base(id, Query::empty()))
}

impl Searcher for CompoundSearcher {
    fn search(&self, ctx: &Context, query: &Query) -> Result<Vec<SearchResult>, SearchError> {
        let started = Instant::now();
        let plan = self.plan(query)?;
        let results = execute::execute(ctx, &plan.executable, &plan.specs)?.into_results();
        let results = match &query.pagination {
            Some(pagination) => page_results(results, pagination),
            None => results,
        };
        debug!(
            leaves = plan.executable.leaf_count(),
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compound search finished"
        );
        Ok(results)
    }

    fn count(&self, ctx: &Context, query: &Query) -> Result<usize, SearchError> {
        let unpaged = query.clone().without_pagination();
        Ok(self.search(ctx, &unpaged)?.len())
    }
}

/// The trees a search goes through, for explaining how a query runs.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Tree straight out of the planner; `None` for an unconstrained query.
    pub built: Option<RequestNode>,
    /// Tree after merging same-backend siblings.
    pub condensed: Option<RequestNode>,
    /// Tree that runs, including any ordering leaf.
    pub executable: RequestNode,
    /// Specs the trees refer to.
    specs: SpecTable,
}

impl Plan {
    /// Name of the spec behind `id`.
    pub fn spec_name(&self, id: SpecId) -> &str {
        &self.specs.get(id).name
    }

    /// Number of specs synthesized for linked fields.
    pub fn synthesized(&self) -> usize {
        self.specs.specs.len() - self.specs.registered
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "searchers:")?;
        for (i, spec) in self.specs.specs.iter().enumerate() {
            let marker = if spec.is_default { " (default)" } else { "" };
            writeln!(f, "  {}: {}{marker}", SpecId(i), spec.name)?;
        }
        writeln!(f, "plan:")?;
        match &self.built {
            Some(node) => write!(f, "{node}")?,
            None => writeln!(f, "(no constraint)")?,
        }
        if self.condensed != self.built {
            writeln!(f, "condensed:")?;
            if let Some(node) = &self.condensed {
                write!(f, "{node}")?;
            }
        }
        writeln!(f, "execute:")?;
        write!(f, "{}", self.executable)
    }
}
