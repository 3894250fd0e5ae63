//! Configuration file discovery.
//!
//! Finds `fedq.toml` by walking up the directory tree from a starting point,
//! falling back to the global `~/.fedq.toml` when no local catalog exists.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = "fedq.toml";

/// The global configuration filename, stored in the home directory.
pub const GLOBAL_CONFIG_FILENAME: &str = ".fedq.toml";

/// Finds the configuration file governing `cwd`.
///
/// Returns the `fedq.toml` closest to `cwd`, or the global config if no local
/// file exists. Returns `None` when neither is present.
pub fn discover_config_file(cwd: &Path) -> Option<PathBuf> {
    let local = cwd
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|path| path.is_file());

    local.or_else(|| global_config_path().filter(|path| path.is_file()))
}

/// Returns the path to the global configuration file (`~/.fedq.toml`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(GLOBAL_CONFIG_FILENAME))
}

/// Checks if a path is the global configuration file.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}
