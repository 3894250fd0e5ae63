//! Utilities for inspecting and reshaping queries.

use crate::ast::{BaseQuery, BooleanQuery, MatchFieldQuery, Query, QueryKind};

/// Conjunction of `queries`, unwrapping a single element.
///
/// An empty list yields the empty query.
pub fn conjunction_or_single(mut queries: Vec<Query>) -> Query {
    match queries.len() {
        0 => Query::empty(),
        1 => queries.remove(0),
        _ => Query::conjunction(queries),
    }
}

/// Disjunction of `queries`, unwrapping a single element.
///
/// An empty list yields the empty query.
pub fn disjunction_or_single(mut queries: Vec<Query>) -> Query {
    match queries.len() {
        0 => Query::empty(),
        1 => queries.remove(0),
        _ => Query::disjunction(queries),
    }
}

/// Every field predicate in `query`, depth first.
pub fn fields(query: &Query) -> Vec<&MatchFieldQuery> {
    let mut out = Vec::new();
    collect_fields(query, &mut out);
    out
}

/// Pushes every field predicate under `query` onto `out`.
fn collect_fields<'a>(query: &'a Query, out: &mut Vec<&'a MatchFieldQuery>) {
    match &query.kind {
        None => {}
        Some(QueryKind::Conjunction(qs)) | Some(QueryKind::Disjunction(qs)) => {
            for q in qs {
                collect_fields(q, out);
            }
        }
        Some(QueryKind::Boolean(b)) => {
            for q in b.must.iter().chain(&b.must_not) {
                collect_fields(q, out);
            }
        }
        Some(QueryKind::Base(BaseQuery::MatchField(m))) => out.push(m),
        Some(QueryKind::Base(BaseQuery::MatchLinkedFields(ms))) => out.extend(ms),
        Some(QueryKind::Base(BaseQuery::DocIds(_) | BaseQuery::MatchNone)) => {}
    }
}

/// Removes field predicates whose label fails `keep`.
///
/// Composite queries left without children disappear; `None` means nothing
/// remained. Pagination on the root is preserved.
pub fn filter_fields<F>(query: Query, keep: &F) -> Option<Query>
where
    F: Fn(&str) -> bool,
{
    let pagination = query.pagination;
    let kind = match query.kind {
        None => return Some(Query::empty()),
        Some(kind) => kind,
    };
    let filtered = match kind {
        QueryKind::Conjunction(qs) => {
            let kept = filter_all(qs, keep);
            (!kept.is_empty()).then(|| Query::conjunction(kept))
        }
        QueryKind::Disjunction(qs) => {
            let kept = filter_all(qs, keep);
            (!kept.is_empty()).then(|| Query::disjunction(kept))
        }
        QueryKind::Boolean(BooleanQuery { must, must_not }) => {
            let must = filter_all(must, keep);
            let must_not = filter_all(must_not, keep);
            if must.is_empty() && must_not.is_empty() {
                None
            } else {
                Some(Query::boolean(must, must_not))
            }
        }
        QueryKind::Base(BaseQuery::MatchField(m)) => {
            keep(&m.field).then(|| Query::base(BaseQuery::MatchField(m)))
        }
        QueryKind::Base(BaseQuery::MatchLinkedFields(ms)) => {
            let kept: Vec<MatchFieldQuery> = ms.into_iter().filter(|m| keep(&m.field)).collect();
            (!kept.is_empty()).then(|| Query::match_linked_fields(kept))
        }
        QueryKind::Base(base) => Some(Query::base(base)),
    };
    filtered.map(|mut q| {
        q.pagination = pagination;
        q
    })
}

/// Filters each query, dropping those left empty.
fn filter_all<F>(queries: Vec<Query>, keep: &F) -> Vec<Query>
where
    F: Fn(&str) -> bool,
{
    queries
        .into_iter()
        .filter_map(|q| filter_fields(q, keep))
        .collect()
}
