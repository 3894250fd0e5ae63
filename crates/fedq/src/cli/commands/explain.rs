//! Implementation of `fedq explain`.

use std::process::ExitCode;

use fedq_query::Pagination;

use crate::cli::{
    args::ExplainCommand,
    context::{CommandContext, parse_query_or_failure},
    output::{dim, print_indented, subheader},
};

/// Prints the parsed query and the trees it plans to, without searching.
pub fn run(ctx: &CommandContext, cmd: &ExplainCommand) -> ExitCode {
    let mut query = match parse_query_or_failure(&cmd.query.query) {
        Ok(q) => q,
        Err(code) => return code,
    };
    let sort_options = cmd.sort.sort_options();
    if !sort_options.is_empty() {
        query = query.with_pagination(Pagination::sorted_by(sort_options));
    }

    println!("{}", subheader("Query:"));
    println!("   {}", cmd.query.query);
    println!();

    println!("{}", subheader("Parsed AST:"));
    if query.is_empty() {
        println!("   {}", dim("(empty query, matches everything)"));
    } else {
        print_indented(&query.to_string(), "   ");
    }
    println!();

    let catalog = match ctx.catalog() {
        Ok(c) => c,
        Err(code) => return code,
    };
    let plan = match catalog.searcher.plan(&query) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: planning failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", subheader("Plan:"));
    print_indented(&plan.to_string(), "   ");
    if plan.synthesized() > 0 {
        println!();
        println!(
            "   {}",
            dim(&format!(
                "{} searcher(s) synthesized for linked fields",
                plan.synthesized()
            ))
        );
    }

    ExitCode::SUCCESS
}
