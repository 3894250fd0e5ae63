//! Runs an execution tree against the backends.

use tracing::trace;

use super::{SpecTable, result_set::ResultSet, tree::RequestNode};
use crate::{context::Context, error::SearchError, result::transform_results};

/// Executes `node`, checking `ctx` before every backend call.
pub(crate) fn execute(
    ctx: &Context,
    node: &RequestNode,
    table: &SpecTable,
) -> Result<ResultSet, SearchError> {
    match node {
        RequestNode::Base { spec: id, query } => {
            ctx.check()?;
            let spec = table.get(*id);
            trace!(spec = %spec.name, "dispatching backend query");
            let mut results = spec.searcher.search(ctx, query)?;
            if let Some(transformation) = &spec.transformation {
                results = transform_results(ctx, results, transformation);
            }
            Ok(ResultSet::new(results, query.is_sorted()))
        }
        RequestNode::And(children) => {
            let (first, rest) = children
                .split_first()
                .ok_or(SearchError::EmptyExecutionTree)?;
            let mut acc = execute(ctx, first, table)?;
            for child in rest {
                if acc.is_empty() {
                    break;
                }
                acc = acc.intersect(execute(ctx, child, table)?);
            }
            Ok(acc)
        }
        RequestNode::Or(children) => {
            let (first, rest) = children
                .split_first()
                .ok_or(SearchError::EmptyExecutionTree)?;
            let mut acc = execute(ctx, first, table)?;
            for child in rest {
                acc = acc.union(execute(ctx, child, table)?);
            }
            Ok(acc)
        }
        RequestNode::Boolean { must, must_not } => {
            let excluded = execute(ctx, must_not, table)?;
            let kept = execute(ctx, must, table)?;
            if excluded.is_empty() {
                return Ok(kept);
            }
            Ok(kept.subtract(excluded))
        }
        RequestNode::LeftJoinWithRightOrder { left, right } => {
            let rows = execute(ctx, left, table)?;
            if rows.is_empty() {
                return Ok(rows);
            }
            let order = execute(ctx, right, table)?;
            if order.is_empty() || !order.is_ordered() {
                return Ok(rows);
            }
            Ok(rows.left_join_with_right_order(order))
        }
    }
}
