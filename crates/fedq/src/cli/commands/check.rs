//! Implementation of `fedq check`.

use std::process::ExitCode;

use fedq_config::{ConfigWarning, is_global_config};

use crate::cli::{
    catalog::Catalog,
    context::CommandContext,
    output::{dim, header, subheader, warning},
};

/// Exit codes for `fedq check`.
mod exit_codes {
    use std::process::ExitCode;

    /// Configuration is valid with no warnings.
    pub const OK: ExitCode = ExitCode::SUCCESS;
    /// Configuration has warnings but is usable.
    pub const WARNINGS: ExitCode = ExitCode::FAILURE;
    /// Configuration has errors and cannot be used.
    pub const ERROR: ExitCode = ExitCode::FAILURE;
}

/// Reports the loaded configuration, loads every entity, and lists any
/// problems found.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    println!("{}", header("Checking configuration..."));
    println!();

    if let Some(path) = &config.config_path {
        let scope = if is_global_config(path) { " (global)" } else { "" };
        println!("{}", subheader("Config file:"));
        println!("  {}{}", path.display(), dim(scope));
        println!();
    }

    println!("{}", subheader("Entities:"));
    for entity in &config.entities {
        let mut notes = Vec::new();
        if entity.is_default {
            notes.push("default".to_string());
        }
        if let Some(link) = &entity.link {
            notes.push(format!("link={link}"));
        }
        if let Some(link) = &entity.link_to_prev {
            notes.push(format!("link_to_prev={link}"));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        println!(
            "  {}{} {}",
            entity.name,
            dim(&notes),
            dim(&format!("[{} fields]", entity.fields.len()))
        );
        for field in &entity.fields {
            println!(
                "    {} -> {} {}",
                field.label,
                field.path,
                dim(&format!("({})", field.field_type))
            );
        }
    }
    println!();

    match config.settings_to_toml() {
        Ok(settings) => {
            println!("{}", subheader("Effective settings:"));
            print!("{settings}");
            println!();
        }
        Err(e) => eprintln!("warning: could not render settings: {e}"),
    }

    let warnings = config.validate();
    let files_ok = !warnings
        .iter()
        .any(|w| matches!(w, ConfigWarning::DataFileMissing { .. }));
    if files_ok {
        match Catalog::load(config) {
            Ok(catalog) => {
                println!("{}", subheader("Data:"));
                for backend in &catalog.backends {
                    let count = format!("{} documents", backend.searcher.len());
                    println!("  {} {}", backend.name, dim(&count));
                }
                println!();
            }
            Err(e) => {
                eprintln!("error: {e}");
                return exit_codes::ERROR;
            }
        }
    }

    if warnings.is_empty() {
        println!("No issues found.");
        return exit_codes::OK;
    }

    println!("{}", warning(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("  - {w}");
    }
    println!();

    print_hints(&warnings);

    exit_codes::WARNINGS
}

/// Prints hints for resolving common warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .map(|w| match w {
            ConfigWarning::NoDefaultEntity => {
                "Set `default = true` on the entity whose ids searches return."
            }
            ConfigWarning::LinkOnFirstEntity { .. } => {
                "The first entity has no predecessor; remove its link_to_prev."
            }
            ConfigWarning::NoFields { .. } => {
                "Add an [entity.fields] table mapping labels to document paths."
            }
            ConfigWarning::NoData { .. } | ConfigWarning::DataFileMissing { .. } => {
                "Point `data` at JSON files relative to fedq.toml."
            }
            ConfigWarning::Unlinked { .. } => {
                "Add `link` naming the document path that holds default entity ids."
            }
        })
        .collect();

    hints.sort_unstable();
    hints.dedup();

    println!("Hints:");
    for hint in hints {
        println!("  - {hint}");
    }
}
