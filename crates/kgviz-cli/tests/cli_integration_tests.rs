//! CLI integration tests for kgviz
//!
//! Tests the kgviz CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SAMPLE: &str = r#"{
    "nodes": [
        {"id": "alice", "name": "Alice", "type": "person"},
        {"id": "bob", "name": "Bob", "type": "person"},
        {"id": "acme", "name": "Acme", "type": "company"}
    ],
    "links": [
        {"source": "alice", "target": "bob", "type": "knows"},
        {"source": "alice", "target": "acme", "type": "works_at", "description": "since 2020"}
    ]
}"#;

/// Command isolated from the user's config and database
#[allow(deprecated)]
fn kgviz_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kgviz").unwrap();
    cmd.env("KGVIZ_CONFIG_DIR", dir.path().join("config"));
    cmd.env("KGVIZ_DATABASE", dir.path().join("graph.db"));
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(dir.path());
    cmd
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_import_reports_counts() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap(), "--domain", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Import into domain 'demo'"))
        .stdout(predicate::str::contains(
            "created 3, updated 0, skipped 0, conflicts 0, errors 0",
        ));
}

#[test]
fn test_second_import_renames_under_auto_id() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap()])
        .assert()
        .success();

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice -> alice_1"))
        .stdout(predicate::str::contains("entity_id_conflict"));
}

#[test]
fn test_import_json_output() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    let output = kgviz_cmd(&dir)
        .args([
            "import",
            file.to_str().unwrap(),
            "--strategy",
            "skip",
            "--conflict-resolution",
            "skip",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let data: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(data["import_stats"]["entities"]["created"], 3);
    assert_eq!(data["import_stats"]["relationships"]["created"], 2);
    assert_eq!(data["entity_id_mapping"]["bob"], "bob");
    assert_eq!(data["strategy"], "skip");
    assert_eq!(data["domain"], "default");
}

#[test]
fn test_dry_run_leaves_database_empty() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap(), "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    kgviz_cmd(&dir)
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entities:      0"));
}

#[test]
fn test_import_rejects_bad_payload() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "bad.json", r#"{"nodes": {}, "links": []}"#);

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'nodes' must be an array"));
}

#[test]
fn test_import_rejects_unknown_strategy() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap(), "--strategy", "replace"])
        .assert()
        .failure();
}

#[test]
fn test_validate_good_and_bad_files() {
    let dir = TempDir::new().unwrap();
    let good = write_file(dir.path(), "good.json", SAMPLE);
    let bad = write_file(
        dir.path(),
        "bad.json",
        r#"{"nodes": [{"id": "a", "name": "A"}], "links": [{"source": "a", "target": "zz", "type": "t"}]}"#,
    );

    kgviz_cmd(&dir)
        .args(["validate", good.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nodes: 3 total, 3 valid, 0 invalid"));

    kgviz_cmd(&dir)
        .args(["validate", bad.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("target node does not exist: zz"));
}

#[test]
fn test_export_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);
    let exported = dir.path().join("export.json");

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap(), "--domain", "demo"])
        .assert()
        .success();

    kgviz_cmd(&dir)
        .args([
            "export",
            "--domain",
            "demo",
            "--output",
            exported.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&exported).unwrap();
    let data: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(data["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(data["links"].as_array().unwrap().len(), 2);

    kgviz_cmd(&dir)
        .args(["import", exported.to_str().unwrap(), "--domain", "copy"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Relationships: created 2, updated 0, skipped 0, errors 0",
        ));
}

#[test]
fn test_clear_requires_force() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap(), "--domain", "demo"])
        .assert()
        .success();

    kgviz_cmd(&dir)
        .args(["clear", "--domain", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    kgviz_cmd(&dir)
        .args(["clear", "--domain", "demo", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 entities, 2 relationships deleted"));
}

#[test]
fn test_stats_by_type() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap()])
        .assert()
        .success();

    kgviz_cmd(&dir)
        .args(["stats", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"person\": 2"))
        .stdout(predicate::str::contains("\"works_at\": 1"));
}

#[test]
fn test_config_set_get_reset() {
    let dir = TempDir::new().unwrap();

    kgviz_cmd(&dir)
        .args(["config", "set", "import.strategy", "overwrite"])
        .assert()
        .success();

    kgviz_cmd(&dir)
        .args(["config", "get", "import.strategy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("overwrite"));

    kgviz_cmd(&dir)
        .args(["config", "set", "import.strategy", "bogus"])
        .assert()
        .failure();

    kgviz_cmd(&dir).args(["config", "reset"]).assert().success();

    kgviz_cmd(&dir)
        .args(["config", "get", "import.strategy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("merge"));
}

#[test]
fn test_configured_defaults_apply_to_import() {
    let dir = TempDir::new().unwrap();
    let file = write_file(dir.path(), "graph.json", SAMPLE);

    kgviz_cmd(&dir)
        .args(["config", "set", "import.domain", "configured"])
        .assert()
        .success();

    kgviz_cmd(&dir)
        .args(["import", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Import into domain 'configured'"));
}
