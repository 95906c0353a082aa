//! End-to-end CLI runs over a small papers table.
//!
//! Each test runs the `coauthor` binary as a subprocess in an isolated temp
//! directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn coauthor_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("coauthor"));
    cmd.current_dir(dir);
    cmd.env("COAUTHOR_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn write_papers(dir: &Path) {
    std::fs::write(
        dir.join("papers.csv"),
        "eid,authors_str\n\
         P1,Bob; Alice; Carol\n\
         P2,Alice; Dan\n\
         P3,Alice\n",
    )
    .expect("write papers");
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = coauthor_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[test]
fn stages_run_one_by_one() {
    let dir = TempDir::new().expect("tempdir");
    write_papers(dir.path());

    let edges = run_json(dir.path(), &["edges", "--papers", "papers.csv"]);
    assert_eq!(edges["edges"], 4);
    assert_eq!(edges["nodes"], 4);
    assert!(
        edges["content_hash"]
            .as_str()
            .expect("hash")
            .starts_with("blake3:")
    );
    assert!(dir.path().join("author_edges.csv").is_file());
    assert!(dir.path().join("author_nodes.csv").is_file());

    let top = run_json(dir.path(), &["top", "-k", "2"]);
    let names: Vec<&str> = top["top"]
        .as_array()
        .expect("top array")
        .iter()
        .map(|r| r["author"].as_str().expect("author"))
        .collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert_eq!(top["top_edges"], 4);

    let network = run_json(dir.path(), &["network", "-k", "2"]);
    assert_eq!(network["subgraph"]["edges"], 1);
    assert_eq!(network["communities"], 1);

    let view: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("network.json")).expect("read view"),
    )
    .expect("view json");
    let nodes = view["nodes"].as_array().expect("nodes");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0]["id"], "Alice");
    assert_eq!(nodes[0]["title"], "Alice<br>Co-authors: 3");
    assert_eq!(nodes[0]["color"], "#e41a1c");
    assert_eq!(view["edges"][0]["title"], "1 shared paper(s)");
}

#[test]
fn run_writes_every_artifact_to_out_dir() {
    let dir = TempDir::new().expect("tempdir");
    write_papers(dir.path());

    coauthor_cmd(dir.path())
        .args(["run", "--papers", "papers.csv", "--out-dir", "artifacts", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("edges records=3 skipped=0 edges=4"))
        .stdout(predicate::str::contains("network nodes=4"));

    for file in [
        "author_edges.csv",
        "author_nodes.csv",
        "author_degrees.csv",
        "author_top_edges.csv",
        "author_top_nodes.csv",
        "network.json",
    ] {
        assert!(dir.path().join("artifacts").join(file).is_file(), "{file} missing");
    }
}

#[test]
fn config_file_sets_defaults() {
    let dir = TempDir::new().expect("tempdir");
    write_papers(dir.path());
    std::fs::write(
        dir.path().join("coauthor.toml"),
        "[select]\ntop_n = 1\n\n[aggregate]\ntrack_weights = false\n",
    )
    .expect("write config");

    let report = run_json(dir.path(), &["run", "--papers", "papers.csv"]);
    assert_eq!(report["edges"]["weighted"], false);
    assert_eq!(report["top"]["top"].as_array().expect("top").len(), 1);

    let header = std::fs::read_to_string(dir.path().join("author_edges.csv")).expect("edges");
    assert!(header.starts_with("source,target\n"));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn top_before_edges_reports_missing_artifact() {
    let dir = TempDir::new().expect("tempdir");
    coauthor_cmd(dir.path())
        .args(["top", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2001]"))
        .stderr(predicate::str::contains("author_edges.csv"));
}

#[test]
fn papers_without_author_column_is_schema_mismatch() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("papers.csv"), "eid,title\nP1,Graphs\n").expect("write");

    let output = coauthor_cmd(dir.path())
        .args(["edges", "--papers", "papers.csv", "--json"])
        .output()
        .expect("command should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("json error");
    assert_eq!(err["error"]["error_code"], "E2002");
    assert!(
        err["error"]["message"]
            .as_str()
            .expect("message")
            .contains("authors_str")
    );
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("coauthor.toml"), "[select\n").expect("write config");
    coauthor_cmd(dir.path())
        .args(["network", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1002]"));
}
