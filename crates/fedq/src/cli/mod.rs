//! CLI support for the `fedq` binary.

pub mod args;
pub mod catalog;
pub mod commands;
pub mod context;
pub mod logging;
pub mod output;

pub use context::CommandContext;
