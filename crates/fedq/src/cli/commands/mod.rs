//! Command implementations and dispatch.

pub mod check;
pub mod count;
pub mod explain;
pub mod search;
pub mod sql;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: &Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Search(cmd) => search::run(ctx, cmd),
        Commands::Count(cmd) => count::run(ctx, cmd),
        Commands::Explain(cmd) => explain::run(ctx, cmd),
        Commands::Sql(cmd) => sql::run(ctx, cmd),
        Commands::Check => check::run(ctx),
    }
}
