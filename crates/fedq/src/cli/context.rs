//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use fedq_config::Config;
use fedq_query::{ParseOptions, Query, parse_query_string};
use fedq_search::Context;

use super::catalog::Catalog;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Loaded configuration.
    pub config: Config,
}

impl CommandContext {
    /// Loads the configuration from `config_path`, or discovers it from the
    /// current directory.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ExitCode> {
        let loaded = match config_path {
            Some(path) => Config::load_file(path),
            None => Config::load(&current_dir_or_failure()?),
        };
        let config = loaded.map_err(|e| {
            eprintln!("error: failed to load configuration: {e}");
            ExitCode::FAILURE
        })?;
        Ok(Self { config })
    }

    /// Loads every entity and assembles the compound searcher.
    pub fn catalog(&self) -> Result<Catalog, ExitCode> {
        Catalog::load(&self.config).map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        })
    }

    /// A request context carrying the configured deadline.
    pub fn search_context(&self) -> Context {
        match self.config.settings.timeout_ms {
            Some(ms) => Context::with_timeout(Duration::from_millis(ms)),
            None => Context::background(),
        }
    }
}

/// Parses a query string, treating blank input as "match everything".
pub fn parse_query_or_failure(text: &str) -> Result<Query, ExitCode> {
    parse_query_string(text, &ParseOptions::match_all_if_empty()).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::FAILURE
    })
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}
