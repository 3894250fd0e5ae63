//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use fedq_search::SearchResult;
use serde::Serialize;

/// ANSI escape codes for terminal styling.
mod colors {
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Cyan text (for headers).
    pub const CYAN: &str = "\x1b[36m";
    /// Yellow text (for warnings).
    pub const YELLOW: &str = "\x1b[33m";
    /// Dim/gray text (for less important info).
    pub const DIM: &str = "\x1b[2m";
    /// Reset all formatting.
    pub const RESET: &str = "\x1b[0m";
}

/// Formats a header with bold cyan styling.
pub fn header(text: &str) -> String {
    format!("{}{}{}{}", colors::BOLD, colors::CYAN, text, colors::RESET)
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    format!("{}{}{}", colors::BOLD, text, colors::RESET)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    format!("{}{}{}", colors::DIM, text, colors::RESET)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    format!("{}{}{}", colors::YELLOW, text, colors::RESET)
}

/// Prints `text` indented by `indent`, line by line.
pub fn print_indented(text: &str, indent: &str) {
    for line in text.lines() {
        println!("{indent}{line}");
    }
}

/// JSON output for `fedq search`.
#[derive(Serialize)]
struct JsonSearchOutput<'a> {
    /// The query string as given.
    query: &'a str,
    /// Number of results on this page.
    total: usize,
    /// The results.
    results: &'a [SearchResult],
}

/// Serializes `value` as pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Prints search results as JSON or as a table.
pub fn output_results(results: &[SearchResult], query: &str, json: bool) -> ExitCode {
    if json {
        return print_json(&JsonSearchOutput {
            query,
            total: results.len(),
            results,
        });
    }

    if results.is_empty() {
        println!("{}", dim("No results."));
        return ExitCode::SUCCESS;
    }

    println!("{}", results_table(results));
    let noun = if results.len() == 1 { "result" } else { "results" };
    println!("{}", dim(&format!("{} {noun}", results.len())));
    ExitCode::SUCCESS
}

/// Builds the result table: one row per id, with matched values when any
/// result carries them.
fn results_table(results: &[SearchResult]) -> Table {
    let show_matches = results.iter().any(|r| !r.matches.is_empty());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    if show_matches {
        table.set_header(vec!["Id", "Matches"]);
    } else {
        table.set_header(vec!["Id"]);
    }

    for result in results {
        let mut row = vec![Cell::new(&result.id)];
        if show_matches {
            row.push(Cell::new(format_matches(result)));
        }
        table.add_row(row);
    }
    table
}

/// Renders a result's matches as `path: a, b` lines.
fn format_matches(result: &SearchResult) -> String {
    result
        .matches
        .iter()
        .map(|(path, values)| format!("{path}: {}", values.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
