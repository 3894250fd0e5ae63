//! Implementation of `fedq sql`.

use std::process::ExitCode;

use fedq_query::Pagination;
use fedq_search::sql::{SqlQuery, compile_where, select_ids};

use crate::cli::{
    args::SqlCommand,
    catalog::registry_for,
    context::{CommandContext, parse_query_or_failure},
    output::{dim, print_json, subheader},
};

/// Prints the statement an entity's relational backend would run.
pub fn run(ctx: &CommandContext, cmd: &SqlCommand) -> ExitCode {
    let Some(entity) = ctx.config.entity(&cmd.entity) else {
        let known: Vec<_> = ctx.config.entities.iter().map(|e| e.name.as_str()).collect();
        eprintln!(
            "error: unknown entity '{}' (known: {})",
            cmd.entity,
            known.join(", ")
        );
        return ExitCode::FAILURE;
    };

    let registry = match registry_for(entity) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut query = match parse_query_or_failure(&cmd.query.query) {
        Ok(q) => q,
        Err(code) => return code,
    };

    let compiled = if cmd.where_only {
        compile_where(&entity.name, &query, &registry).map(|w| {
            w.unwrap_or_else(|| SqlQuery {
                clause: "true".to_string(),
                params: Vec::new(),
            })
        })
    } else {
        let mut pagination =
            Pagination::sorted_by(cmd.sort.sort_options()).with_offset(cmd.page.offset);
        if let Some(limit) = cmd.page.limit {
            pagination = pagination.with_limit(limit);
        }
        query = query.with_pagination(pagination);
        select_ids(&entity.name, &query, &registry)
    };

    let sql = match compiled {
        Ok(sql) => sql,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cmd.json {
        return print_json(&sql);
    }

    println!("{}", sql.clause);
    if !sql.params.is_empty() {
        println!();
        println!("{}", subheader("Parameters:"));
        for (i, param) in sql.params.iter().enumerate() {
            println!("   {} {param}", dim(&format!("${}", i + 1)));
        }
    }
    ExitCode::SUCCESS
}
