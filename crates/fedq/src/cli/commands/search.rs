//! Implementation of `fedq search`.

use std::process::ExitCode;

use fedq_query::{BaseQuery, Query, QueryKind};
use fedq_search::Searcher;

use crate::cli::{
    args::SearchCommand,
    context::{CommandContext, parse_query_or_failure},
    output::output_results,
};

/// Runs a query across the catalog and prints matching ids.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let mut query = match parse_query_or_failure(&cmd.query.query) {
        Ok(q) => q,
        Err(code) => return code,
    };
    if cmd.highlight {
        highlight_fields(&mut query);
    }
    let query = query.with_pagination(cmd.pagination(ctx.config.settings.default_limit));

    let catalog = match ctx.catalog() {
        Ok(c) => c,
        Err(code) => return code,
    };

    match catalog.searcher.search(&ctx.search_context(), &query) {
        Ok(results) => output_results(&results, &cmd.query.query, cmd.json),
        Err(e) => {
            eprintln!("error: search failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Marks every field predicate in `query` as highlighted.
fn highlight_fields(query: &mut Query) {
    match &mut query.kind {
        None | Some(QueryKind::Base(BaseQuery::DocIds(_) | BaseQuery::MatchNone)) => {}
        Some(QueryKind::Conjunction(queries) | QueryKind::Disjunction(queries)) => {
            queries.iter_mut().for_each(highlight_fields);
        }
        Some(QueryKind::Boolean(b)) => {
            b.must.iter_mut().for_each(highlight_fields);
            b.must_not.iter_mut().for_each(highlight_fields);
        }
        Some(QueryKind::Base(BaseQuery::MatchField(m))) => m.highlight = true,
        Some(QueryKind::Base(BaseQuery::MatchLinkedFields(fields))) => {
            for m in fields {
                m.highlight = true;
            }
        }
    }
}
