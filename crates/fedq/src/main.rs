//! Command-line interface for `fedq`.

use std::process::ExitCode;

use clap::Parser;
use fedq::cli::{CommandContext, args::Cli, commands, logging::init_logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = match CommandContext::load(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    commands::run(&cli.command, &ctx)
}
