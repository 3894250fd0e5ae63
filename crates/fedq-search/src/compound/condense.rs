//! Merges sibling leaves that target the same backend.

use std::collections::HashMap;

use fedq_query::{Query, QueryKind};

use super::tree::{RequestNode, SpecId};
use crate::error::SearchError;

/// The composite a group of children sits under.
#[derive(Clone, Copy)]
enum Combinator {
    /// Intersection.
    And,
    /// Union.
    Or,
}

impl Combinator {
    /// Combines same-spec queries into one.
    fn merge(self, queries: Vec<Query>) -> Query {
        match self {
            Self::And => Query::conjunction(queries),
            Self::Or => Query::disjunction(queries),
        }
    }

    /// Rebuilds the composite node.
    fn wrap(self, children: Vec<RequestNode>) -> RequestNode {
        match self {
            Self::And => RequestNode::And(children),
            Self::Or => RequestNode::Or(children),
        }
    }
}

/// Condenses `node` bottom-up.
///
/// Leaves under one `And` or `Or` that target the same spec become a single
/// leaf, placed where the first of them was. A composite left with one child
/// is replaced by that child. A boolean whose sides both land on one spec
/// becomes a single boolean leaf.
pub(crate) fn condense(node: RequestNode) -> Result<RequestNode, SearchError> {
    match node {
        RequestNode::And(children) => condense_group(children, Combinator::And),
        RequestNode::Or(children) => condense_group(children, Combinator::Or),
        RequestNode::Boolean { must, must_not } => condense_boolean(*must, *must_not),
        RequestNode::LeftJoinWithRightOrder { left, right } => {
            Ok(RequestNode::LeftJoinWithRightOrder {
                left: Box::new(condense(*left)?),
                right: Box::new(condense(*right)?),
            })
        }
        base @ RequestNode::Base { .. } => Ok(base),
    }
}

/// A position in a condensed child list.
enum Slot {
    /// A child kept as is.
    Node(RequestNode),
    /// Where the merged leaf for a spec goes.
    Group(SpecId),
}

/// Merges same-spec leaves among `children`.
fn condense_group(
    children: Vec<RequestNode>,
    combinator: Combinator,
) -> Result<RequestNode, SearchError> {
    if children.is_empty() {
        return Err(SearchError::EmptyExecutionTree);
    }

    let mut slots = Vec::with_capacity(children.len());
    let mut groups: HashMap<SpecId, Vec<Query>> = HashMap::new();
    for child in children {
        match condense(child)? {
            RequestNode::Base { spec, query } => {
                let group = groups.entry(spec).or_default();
                if group.is_empty() {
                    slots.push(Slot::Group(spec));
                }
                group.push(query);
            }
            other => slots.push(Slot::Node(other)),
        }
    }

    let mut merged: Vec<RequestNode> = slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Node(node) => node,
            Slot::Group(spec) => {
                let mut queries = groups.remove(&spec).unwrap_or_default();
                let query = if queries.len() == 1 {
                    queries.remove(0)
                } else {
                    combinator.merge(queries)
                };
                RequestNode::base(spec, query)
            }
        })
        .collect();

    if merged.len() == 1 {
        if let Some(only) = merged.pop() {
            return Ok(only);
        }
    }
    Ok(combinator.wrap(merged))
}

/// Condenses both sides, collapsing a same-spec pair into one leaf.
fn condense_boolean(must: RequestNode, must_not: RequestNode) -> Result<RequestNode, SearchError> {
    match (condense(must)?, condense(must_not)?) {
        (
            RequestNode::Base {
                spec,
                query: must_query,
            },
            RequestNode::Base {
                spec: other,
                query: must_not_query,
            },
        ) if spec == other => Ok(RequestNode::base(
            spec,
            Query::boolean(
                split(must_query, Combinator::And),
                split(must_not_query, Combinator::Or),
            ),
        )),
        (must, must_not) => Ok(RequestNode::Boolean {
            must: Box::new(must),
            must_not: Box::new(must_not),
        }),
    }
}

/// Children of a merged conjunction or disjunction, or the query itself.
fn split(query: Query, combinator: Combinator) -> Vec<Query> {
    match (combinator, query) {
        (
            Combinator::And,
            Query {
                kind: Some(QueryKind::Conjunction(children)),
                pagination: None,
            },
        )
        | (
            Combinator::Or,
            Query {
                kind: Some(QueryKind::Disjunction(children)),
                pagination: None,
            },
        ) => children,
        (_, query) => vec![query],
    }
}
