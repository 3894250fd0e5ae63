//! CLI integration tests for fedq commands.
//!
//! These tests focus on exit codes and result ids, not specific output
//! formatting which may change.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// Helper to create a temp directory for tests.
fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to get a fedq command with HOME isolated to `home`.
fn fedq(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("fedq").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

/// Strips ANSI escape sequences from a string.
fn strip_ansi(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            output.push(ch);
        }
    }

    output
}

const CATALOG: &str = r#"
[settings]
default_limit = 20

[[entity]]
name = "deployments"
default = true
data = "data/deployments.json"
[entity.fields]
Deployment = "name"
Namespace = "namespace"
Replicas = { path = "replicas", type = "numeric" }

[[entity]]
name = "images"
data = "data/images.json"
link = "deployment_ids"
[entity.fields]
Image = "name"
"Image Tag" = "tag"
"#;

const DEPLOYMENTS: &str = r#"[
  {"id": "d1", "name": "web", "namespace": "prod", "replicas": 3},
  {"id": "d2", "name": "cache", "namespace": "prod", "replicas": 1},
  {"id": "d3", "name": "api", "namespace": "staging", "replicas": 10}
]"#;

const IMAGES: &str = r#"[
  {"id": "i1", "name": "nginx", "tag": "1.25", "deployment_ids": ["d1"]},
  {"id": "i2", "name": "redis", "tag": "latest", "deployment_ids": ["d2"]},
  {"id": "i3", "name": "nginx", "tag": "latest", "deployment_ids": ["d3"]}
]"#;

/// Writes the two-entity catalog and its data files.
fn setup_catalog() -> tempfile::TempDir {
    let dir = temp_dir();
    fs::write(dir.path().join("fedq.toml"), CATALOG).unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/deployments.json"), DEPLOYMENTS).unwrap();
    fs::write(dir.path().join("data/images.json"), IMAGES).unwrap();
    dir
}

/// Runs `fedq search --json` with `args` and returns the result ids.
fn search_ids(dir: &Path, args: &[&str]) -> Vec<String> {
    let output = fedq(dir)
        .current_dir(dir)
        .arg("search")
        .args(args)
        .arg("--json")
        .assert()
        .success();
    let json: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

mod search {
    use super::*;

    #[test]
    fn field_of_linked_entity_maps_to_default_ids() {
        let dir = setup_catalog();
        assert_eq!(search_ids(dir.path(), &["Image:nginx"]), vec!["d1", "d3"]);
    }

    #[test]
    fn conjunction_across_entities() {
        let dir = setup_catalog();
        assert_eq!(
            search_ids(dir.path(), &["Image:nginx+Namespace:prod"]),
            vec!["d1"]
        );
    }

    #[test]
    fn disjunction_of_values() {
        let dir = setup_catalog();
        assert_eq!(
            search_ids(dir.path(), &["Deployment:web,api"]),
            vec!["d1", "d3"]
        );
    }

    #[test]
    fn empty_query_matches_everything() {
        let dir = setup_catalog();
        assert_eq!(search_ids(dir.path(), &[]), vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn sorts_by_default_entity_field() {
        let dir = setup_catalog();
        assert_eq!(
            search_ids(dir.path(), &["--sort", "Replicas", "--reverse"]),
            vec!["d3", "d1", "d2"]
        );
    }

    #[test]
    fn sorts_by_linked_entity_field() {
        let dir = setup_catalog();
        assert_eq!(
            search_ids(dir.path(), &["--sort", "Image"]),
            vec!["d1", "d3", "d2"]
        );
    }

    #[test]
    fn respects_limit_and_offset() {
        let dir = setup_catalog();
        assert_eq!(
            search_ids(dir.path(), &["--sort", "Replicas", "-n", "1", "--offset", "1"]),
            vec!["d1"]
        );
    }

    #[test]
    fn numeric_comparison() {
        let dir = setup_catalog();
        assert_eq!(search_ids(dir.path(), &["Replicas:>=3"]), vec!["d1", "d3"]);
    }

    #[test]
    fn highlight_reports_matched_values() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .args(["search", "Image Tag:lat", "--highlight", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"matches\""))
            .stdout(predicate::str::contains("\"latest\""));
    }

    #[test]
    fn prints_table() {
        let dir = setup_catalog();
        let output = fedq(dir.path())
            .current_dir(dir.path())
            .args(["search", "Namespace:prod"])
            .assert()
            .success();
        let stdout = strip_ansi(&String::from_utf8_lossy(&output.get_output().stdout));
        assert!(stdout.contains("Id"));
        assert!(stdout.contains("d1"));
        assert!(stdout.contains("d2"));
        assert!(!stdout.contains("d3"));
        assert!(stdout.contains("2 results"));
    }

    #[test]
    fn reports_no_results() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .args(["search", "Image:envoy"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No results"));
    }

    #[test]
    fn query_syntax_error_shows_hint() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .args(["search", "Image"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("query syntax error"));
    }

    #[test]
    fn unknown_field_fails() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .args(["search", "Color:red"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown field"));
    }

    #[test]
    fn unknown_sort_field_fails() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .args(["search", "--sort", "Color"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Color"));
    }

    #[test]
    fn config_flag_overrides_discovery() {
        let dir = setup_catalog();
        let elsewhere = temp_dir();
        let config = dir.path().join("fedq.toml");
        fedq(elsewhere.path())
            .current_dir(elsewhere.path())
            .args(["search", "Deployment:cache", "--json", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"d2\""));
    }
}

mod count {
    use super::*;

    #[test]
    fn counts_matches() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .args(["count", "Namespace:prod"])
            .assert()
            .success()
            .stdout("2\n");
    }

    #[test]
    fn ignores_default_limit() {
        let dir = setup_catalog();
        fs::write(
            dir.path().join("fedq.toml"),
            CATALOG.replace("default_limit = 20", "default_limit = 1"),
        )
        .unwrap();
        fedq(dir.path())
            .current_dir(dir.path())
            .arg("count")
            .assert()
            .success()
            .stdout("3\n");
    }
}

mod explain {
    use super::*;

    #[test]
    fn shows_ast_and_plan() {
        let dir = setup_catalog();
        let output = fedq(dir.path())
            .current_dir(dir.path())
            .args(["explain", "Image:nginx+Namespace:prod", "--sort", "Replicas"])
            .assert()
            .success();
        let stdout = strip_ansi(&String::from_utf8_lossy(&output.get_output().stdout));
        assert!(stdout.contains("Parsed AST"));
        assert!(stdout.contains("Plan:"));
        assert!(stdout.contains("images"));
        assert!(stdout.contains("deployments (default)"));
    }

    #[test]
    fn empty_query() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .arg("explain")
            .assert()
            .success()
            .stdout(predicate::str::contains("matches everything"));
    }
}

mod sql {
    use super::*;

    #[test]
    fn renders_select_with_parameters() {
        let dir = setup_catalog();
        let output = fedq(dir.path())
            .current_dir(dir.path())
            .args(["sql", "deployments", "Namespace:prod", "--sort", "Replicas", "-n", "5"])
            .assert()
            .success();
        let stdout = strip_ansi(&String::from_utf8_lossy(&output.get_output().stdout));
        assert!(stdout.contains("select deployments.id from deployments where"));
        assert!(stdout.contains("deployments.namespace ilike $1"));
        assert!(stdout.contains("LIMIT 5"));
        assert!(stdout.contains("'prod%'"));
    }

    #[test]
    fn json_output() {
        let dir = setup_catalog();
        let output = fedq(dir.path())
            .current_dir(dir.path())
            .args(["sql", "deployments", "Replicas:>2", "--where", "--json"])
            .assert()
            .success();
        let json: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
        assert_eq!(json["clause"], "deployments.replicas > $1");
        assert_eq!(json["params"][0], 2.0);
    }

    #[test]
    fn unknown_entity_fails() {
        let dir = setup_catalog();
        fedq(dir.path())
            .current_dir(dir.path())
            .args(["sql", "pods", "Name:x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown entity 'pods'"));
    }
}

mod check {
    use super::*;

    #[test]
    fn succeeds_with_valid_catalog() {
        let dir = setup_catalog();
        let output = fedq(dir.path())
            .current_dir(dir.path())
            .arg("check")
            .assert()
            .success();
        let stdout = strip_ansi(&String::from_utf8_lossy(&output.get_output().stdout));
        assert!(stdout.contains("No issues found."));
        assert!(stdout.contains("deployments (default)"));
        assert!(stdout.contains("3 documents"));
    }

    #[test]
    fn warns_on_missing_data() {
        let dir = setup_catalog();
        fs::remove_file(dir.path().join("data/images.json")).unwrap();
        fedq(dir.path())
            .current_dir(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stdout(predicate::str::contains("does not exist"));
    }

    #[test]
    fn fails_without_config() {
        let dir = temp_dir();
        fedq(dir.path())
            .current_dir(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("no fedq.toml found"));
    }

    #[test]
    fn fails_on_invalid_toml() {
        let dir = temp_dir();
        fs::write(dir.path().join("fedq.toml"), "[[entity]\ninvalid").unwrap();
        fedq(dir.path())
            .current_dir(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}
