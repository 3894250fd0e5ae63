//! Clap argument definitions for the `fedq` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use fedq_query::{Pagination, SortOption};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "fedq")]
#[command(about = "Federated structured search over JSON catalogs")]
pub struct Cli {
    /// Catalog file to use instead of discovering fedq.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v for planning decisions, -vv for every backend call)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Query text shared by query-taking commands.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Query string, e.g. 'Image:nginx+Cluster:prod'; empty matches everything
    #[arg(default_value = "")]
    pub query: String,
}

/// Shared sort flags.
#[derive(Args, Debug, Clone, Default)]
pub struct SortArgs {
    /// Field label to sort on (can be specified multiple times)
    #[arg(short = 's', long = "sort", value_name = "FIELD")]
    pub sort: Vec<String>,

    /// Sort descending
    #[arg(short = 'r', long)]
    pub reverse: bool,
}

impl SortArgs {
    /// The sort keys in priority order.
    pub fn sort_options(&self) -> Vec<SortOption> {
        self.sort
            .iter()
            .map(|field| {
                if self.reverse {
                    SortOption::desc(field)
                } else {
                    SortOption::asc(field)
                }
            })
            .collect()
    }
}

/// Shared paging flags.
#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Maximum results to return [default: settings.default_limit]
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Number of leading results to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

/// Arguments for `fedq search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    /// Query text.
    pub query: QueryArgs,

    #[command(flatten)]
    /// Sort flags.
    pub sort: SortArgs,

    #[command(flatten)]
    /// Paging flags.
    pub page: PageArgs,

    /// Report the values each field matched
    #[arg(long)]
    pub highlight: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    /// Pagination for this invocation, falling back to `default_limit`.
    pub fn pagination(&self, default_limit: usize) -> Pagination {
        let limit = self.page.limit.unwrap_or(default_limit);
        let pagination = Pagination::sorted_by(self.sort.sort_options()).with_offset(self.page.offset);
        if limit == 0 {
            pagination
        } else {
            pagination.with_limit(limit)
        }
    }
}

/// Arguments for `fedq count`.
#[derive(Args, Debug, Clone)]
pub struct CountCommand {
    #[command(flatten)]
    /// Query text.
    pub query: QueryArgs,
}

/// Arguments for `fedq explain`.
#[derive(Args, Debug, Clone)]
pub struct ExplainCommand {
    #[command(flatten)]
    /// Query text.
    pub query: QueryArgs,

    #[command(flatten)]
    /// Sort flags.
    pub sort: SortArgs,
}

/// Arguments for `fedq sql`.
#[derive(Args, Debug, Clone)]
pub struct SqlCommand {
    /// Entity whose table the statement selects from
    pub entity: String,

    #[command(flatten)]
    /// Query text.
    pub query: QueryArgs,

    #[command(flatten)]
    /// Sort flags.
    pub sort: SortArgs,

    #[command(flatten)]
    /// Paging flags.
    pub page: PageArgs,

    /// Print only the WHERE fragment
    #[arg(long = "where")]
    pub where_only: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Supported `fedq` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog and print matching ids
    #[command(after_help = "\
QUERY SYNTAX:
  Field:value             Field starts with value (case-insensitive)
  Field:a,b               Either value
  Field:a+Other:b         Both fields
  Field:\"value\"           Exact match
  Field:r/regex           Regular expression
  Field:!value            Negation
  Field:>=3               Numeric comparison (<, <=, ==, >=, >)
  Field:*                 Field has any value
  Field:-                 Field is absent

EXAMPLES:
  fedq search 'Image:nginx+Namespace:prod'
  fedq search 'Image Tag:latest' --sort Deployment -n 10
  fedq search '' --sort 'Replica Count' --reverse --json")]
    Search(SearchCommand),

    /// Count matching ids
    Count(CountCommand),

    /// Show how a query is planned across entities without running it
    Explain(ExplainCommand),

    /// Print the SQL one entity's backend would run for a query
    Sql(SqlCommand),

    /// Validate configuration and diagnose issues
    Check,
}
