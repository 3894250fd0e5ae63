//! Implementation of `fedq count`.

use std::process::ExitCode;

use fedq_search::Searcher;

use crate::cli::{
    args::CountCommand,
    context::{CommandContext, parse_query_or_failure},
};

/// Prints the number of ids matching a query.
pub fn run(ctx: &CommandContext, cmd: &CountCommand) -> ExitCode {
    let query = match parse_query_or_failure(&cmd.query.query) {
        Ok(q) => q,
        Err(code) => return code,
    };
    let catalog = match ctx.catalog() {
        Ok(c) => c,
        Err(code) => return code,
    };

    match catalog.searcher.count(&ctx.search_context(), &query) {
        Ok(count) => {
            println!("{count}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: count failed: {e}");
            ExitCode::FAILURE
        }
    }
}
