//! Attaches sort keys to the execution tree.

use fedq_query::{Pagination, Query};

use super::{
    SpecTable,
    tree::{RequestNode, SpecId},
};
use crate::error::SearchError;

/// Makes `tree` produce results in the order `pagination` asks for.
///
/// The sort keys (without offset or limit) go on the root leaf if its spec
/// knows every sort field, else on the first such leaf directly under a root
/// `And`. Failing both, the tree is left-joined with an ordering-only leaf on
/// the first registered spec that knows every sort field.
pub(crate) fn add_sorting(
    tree: RequestNode,
    pagination: Option<&Pagination>,
    table: &SpecTable,
) -> Result<RequestNode, SearchError> {
    let Some(pagination) = pagination.filter(|p| !p.sort_options.is_empty()) else {
        return Ok(tree);
    };
    let fields: Vec<&str> = pagination
        .sort_options
        .iter()
        .map(|s| s.field.as_str())
        .collect();
    let can_sort = |id: SpecId| table.get(id).options.contains_all(&fields);
    let sort = pagination.sort_only();

    let tree = match tree {
        RequestNode::Base { spec, query } if can_sort(spec) => {
            return Ok(RequestNode::base(spec, query.with_pagination(sort)));
        }
        RequestNode::And(mut children) => {
            let target = children
                .iter_mut()
                .find(|child| matches!(child, RequestNode::Base { spec, .. } if can_sort(*spec)));
            if let Some(RequestNode::Base { query, .. }) = target {
                query.pagination = Some(sort);
                return Ok(RequestNode::And(children));
            }
            RequestNode::And(children)
        }
        other => other,
    };

    let sorter = table
        .registered()
        .find(|(id, _)| can_sort(*id))
        .map(|(id, _)| id)
        .ok_or_else(|| {
            SearchError::NoMatchingSortSpec(fields.iter().map(|f| (*f).to_string()).collect())
        })?;
    Ok(RequestNode::LeftJoinWithRightOrder {
        left: Box::new(tree),
        right: Box::new(RequestNode::base(sorter, Query::empty().with_pagination(sort))),
    })
}
