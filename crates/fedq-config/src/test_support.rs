//! Catalog fixtures for fedq-config unit tests.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::discovery::CONFIG_FILENAME;

/// A throwaway directory holding catalog configs and their data files.
pub struct TestCatalog {
    /// Owned temporary root, removed on drop.
    root: TempDir,
}

impl TestCatalog {
    /// Creates an empty catalog directory.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// Root of the catalog directory.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates a directory under the root.
    pub fn dir(&self, rel_path: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Writes a data file holding a JSON array of `documents`, each given as
    /// a JSON object literal.
    pub fn data_file(&self, rel_path: &str, documents: &[&str]) -> PathBuf {
        let path = self.root.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, format!("[{}]", documents.join(",\n"))).unwrap();
        path
    }

    /// Writes a `fedq.toml` with `content` in `rel_dir`.
    pub fn config(&self, rel_dir: &str, content: &str) -> PathBuf {
        let config = self.dir(rel_dir).join(CONFIG_FILENAME);
        fs::write(&config, content).unwrap();
        config
    }

    /// Writes a complete catalog in `rel_dir`: one entity per name, the first
    /// being the default, each with a `Name` field, a one-document data file
    /// and, after the first, a `parent_ids` link.
    pub fn catalog(&self, rel_dir: &str, entities: &[&str]) -> PathBuf {
        let mut toml = String::new();
        for (i, name) in entities.iter().enumerate() {
            let data = format!("{name}.json");
            let document = format!(r#"{{"id": "{name}-1", "name": "{name}"}}"#);
            let data_path = if rel_dir.is_empty() {
                data.clone()
            } else {
                format!("{rel_dir}/{data}")
            };
            self.data_file(&data_path, &[document.as_str()]);

            toml.push_str(&format!("[[entity]]\nname = \"{name}\"\ndata = \"{data}\"\n"));
            if i == 0 {
                toml.push_str("default = true\n");
            } else {
                toml.push_str("link = \"parent_ids\"\n");
            }
            toml.push_str("[entity.fields]\nName = \"name\"\n\n");
        }
        self.config(rel_dir, &toml)
    }
}
