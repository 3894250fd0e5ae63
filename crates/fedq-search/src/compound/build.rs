//! Query to execution-tree planning.
//!
//! Each base predicate is routed to the first backend whose field registry
//! knows its field. Linked-field predicates spanning several backends get a
//! nested compound searcher chained through the backends' `link_to_prev`
//! transformations.

use std::{collections::HashSet, sync::Arc};

use fedq_query::{BaseQuery, MatchFieldQuery, Query, QueryKind};
use tracing::{debug, warn};

use super::{CompoundSearcher, SearcherSpec, SpecTable, tree::RequestNode};
use crate::{
    context::Context,
    error::SearchError,
    options::{CombinedOptions, OptionsMap},
    searcher::Transformation,
};

/// Plans `query` against the specs in `table`.
///
/// Returns `None` when the query places no constraint on the result. Specs
/// synthesized for linked fields are appended to `table`.
pub(crate) fn build(query: &Query, table: &mut SpecTable) -> Result<Option<RequestNode>, SearchError> {
    match table.registered_len() {
        0 => Err(SearchError::NoSearcherSpecs),
        1 => Ok(Some(RequestNode::base(
            table.first(),
            query.clone().without_pagination(),
        ))),
        _ => Planner { table }.plan(query),
    }
}

/// Assigns each leaf of a query to a spec.
pub(super) struct Planner<'a> {
    /// Specs, grown by linked-field chains.
    pub(super) table: &'a mut SpecTable,
}

impl Planner<'_> {
    /// Plans `query`; `None` when it places no constraint.
    pub(super) fn plan(&mut self, query: &Query) -> Result<Option<RequestNode>, SearchError> {
        let Some(kind) = &query.kind else {
            return self.to_default(query, "an empty query").map(Some);
        };
        match kind {
            QueryKind::Conjunction(queries) => Ok(self.plan_all(queries)?.map(RequestNode::And)),
            QueryKind::Disjunction(queries) => Ok(self.plan_all(queries)?.map(RequestNode::Or)),
            QueryKind::Boolean(b) => {
                let Some(must) = self.plan_all(&b.must)?.map(RequestNode::And) else {
                    debug!("boolean query has no placeable must clause, dropping it");
                    return Ok(None);
                };
                let Some(must_not) = self.plan_all(&b.must_not)?.map(RequestNode::Or) else {
                    debug!("boolean query has no placeable must_not clause, dropping it");
                    return Ok(None);
                };
                Ok(Some(RequestNode::Boolean {
                    must: Box::new(must),
                    must_not: Box::new(must_not),
                }))
            }
            QueryKind::Base(BaseQuery::MatchField(m)) => self.plan_field(m, query).map(Some),
            QueryKind::Base(BaseQuery::MatchLinkedFields(fields)) => {
                self.plan_linked(fields, query).map(Some)
            }
            QueryKind::Base(BaseQuery::DocIds(_)) => self.to_default(query, "doc ids").map(Some),
            QueryKind::Base(BaseQuery::MatchNone) => self.to_default(query, "match none").map(Some),
        }
    }

    /// Plans every child, dropping those that impose no constraint.
    fn plan_all(&mut self, queries: &[Query]) -> Result<Option<Vec<RequestNode>>, SearchError> {
        let mut nodes = Vec::with_capacity(queries.len());
        for query in queries {
            if let Some(node) = self.plan(query)? {
                nodes.push(node);
            }
        }
        Ok((!nodes.is_empty()).then_some(nodes))
    }

    /// Places a single field predicate.
    fn plan_field(&mut self, m: &MatchFieldQuery, query: &Query) -> Result<RequestNode, SearchError> {
        let owner = self
            .table
            .registered()
            .find(|(_, spec)| spec.options.get(&m.field).is_some())
            .map(|(id, _)| id);
        match owner {
            Some(id) => Ok(RequestNode::base(id, query.clone().without_pagination())),
            None => {
                warn!(field = %m.field, "no searcher knows field, sending it to the default");
                self.to_default(query, &format!("field '{}'", m.field))
            }
        }
    }

    /// Places linked fields on a covering spec, or on a synthesized chain.
    fn plan_linked(
        &mut self,
        fields: &[MatchFieldQuery],
        query: &Query,
    ) -> Result<RequestNode, SearchError> {
        if fields.is_empty() {
            return Err(SearchError::UnsupportedQueryType(
                "linked fields query without fields".into(),
            ));
        }
        let labels: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();

        let covering = self
            .table
            .registered()
            .find(|(_, spec)| spec.options.contains_all(&labels))
            .map(|(id, _)| id);
        if let Some(id) = covering {
            return Ok(RequestNode::base(id, query.clone().without_pagination()));
        }

        let offset = self
            .table
            .registered()
            .filter(|(_, spec)| spec.options.contains_any(&labels))
            .map(|(id, _)| id.index())
            .last();
        let Some(offset) = offset else {
            warn!(fields = ?labels, "no searcher knows linked fields, sending them to the default");
            return self.to_default(query, &format!("linked fields {labels:?}"));
        };

        let chain = self.table.registered_specs()[..=offset].to_vec();
        let spec = chain_specs(&chain)?;
        let conjunction = Query::conjunction(
            fields
                .iter()
                .cloned()
                .map(|m| Query::base(BaseQuery::MatchField(m)))
                .collect(),
        );
        let id = self.table.push(spec);
        debug!(%id, depth = offset + 1, "synthesized linked-fields searcher");
        Ok(RequestNode::base(id, conjunction))
    }

    /// Routes `query` to the default spec, naming `what` on failure.
    fn to_default(&self, query: &Query, what: &str) -> Result<RequestNode, SearchError> {
        let id = self
            .table
            .default_id()
            .ok_or_else(|| SearchError::NoDefaultSpec(what.to_string()))?;
        Ok(RequestNode::base(id, query.clone().without_pagination()))
    }
}

/// Chains `specs` into one searcher whose results are in the id space of
/// `specs[0]`.
///
/// Spec `i` maps its ids into spec `i - 1`'s space through `link_to_prev`;
/// composing those hops gives each nested spec a transformation into the
/// first spec's space.
fn chain_specs(specs: &[Arc<SearcherSpec>]) -> Result<SearcherSpec, SearchError> {
    let Some(first) = specs.first() else {
        return Err(SearchError::NoSearcherSpecs);
    };

    let mut nested = Vec::with_capacity(specs.len());
    let mut upstream: Option<Transformation> = None;
    for (i, spec) in specs.iter().enumerate() {
        let transformation = if i == 0 {
            None
        } else {
            compose(spec.link_to_prev.clone(), upstream.clone())
        };
        nested.push(SearcherSpec {
            name: spec.name.clone(),
            is_default: i == 0,
            searcher: Arc::clone(&spec.searcher),
            options: Arc::clone(&spec.options),
            transformation: transformation.clone(),
            link_to_prev: None,
        });
        upstream = transformation;
    }

    let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
    let options: Vec<Arc<dyn OptionsMap>> = specs.iter().map(|s| Arc::clone(&s.options)).collect();
    Ok(SearcherSpec {
        name: format!("linked({})", names.join(" > ")),
        is_default: true,
        searcher: Arc::new(CompoundSearcher::new(nested)?),
        options: Arc::new(CombinedOptions::new(options)),
        transformation: first.transformation.clone(),
        link_to_prev: None,
    })
}

/// Applies `hop` then `rest`; a missing side is the identity.
fn compose(hop: Option<Transformation>, rest: Option<Transformation>) -> Option<Transformation> {
    match (hop, rest) {
        (None, None) => None,
        (Some(t), None) | (None, Some(t)) => Some(t),
        (Some(hop), Some(rest)) => Some(Arc::new(move |ctx: &Context, id: &str| {
            let mut seen = HashSet::new();
            hop(ctx, id)
                .iter()
                .flat_map(|mid| rest(ctx, mid.as_str()))
                .filter(|target| seen.insert(target.clone()))
                .collect()
        })),
    }
}
