//! End-to-end CLI tests driving the compiled binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use tempfile::TempDir;

fn fixture_db(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         INSERT INTO customers VALUES (1, 'Alice'), (2, 'Bob');
         CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER,
             FOREIGN KEY (customer_id) REFERENCES customers(id));
         INSERT INTO orders VALUES (100, 1), (101, 2);",
    )
    .unwrap();
    path
}

#[test]
fn build_writes_artifact_with_schema_version() {
    let dir = TempDir::new().unwrap();
    let db = fixture_db(dir.path(), "bank.sqlite");
    let output = dir.path().join("bank.json");

    Command::cargo_bin("schema-graph")
        .unwrap()
        .args(["build", "--db"])
        .arg(&db)
        .args(["--output"])
        .arg(&output)
        .assert()
        .success();

    let content = fs::read_to_string(&output).unwrap();
    let document: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(document["schema_version"], "1.0");
    assert!(document["nodes"].as_array().unwrap().len() >= 4);
}

#[test]
fn build_then_validate_round_trip_succeeds() {
    let dir = TempDir::new().unwrap();
    let db = fixture_db(dir.path(), "bank.sqlite");
    let output = dir.path().join("bank.json");

    Command::cargo_bin("schema-graph")
        .unwrap()
        .args(["build", "--db"])
        .arg(&db)
        .args(["--output"])
        .arg(&output)
        .assert()
        .success();

    Command::cargo_bin("schema-graph")
        .unwrap()
        .args(["validate", "--artifact"])
        .arg(&output)
        .assert()
        .success();
}

#[test]
fn validate_rejects_malformed_artifact() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"nodes": [{"type": "Table"}, {"type": "Table"}], "edges": []}"#).unwrap();

    Command::cargo_bin("schema-graph")
        .unwrap()
        .args(["validate", "--artifact"])
        .arg(&bad)
        .assert()
        .failure();
}

#[test]
fn build_reports_missing_database() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.sqlite");

    Command::cargo_bin("schema-graph")
        .unwrap()
        .args(["build", "--db"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("pipeline run failed"));
}

#[test]
fn batch_processes_every_database_in_directory() {
    let databases = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fixture_db(databases.path(), "one.sqlite");
    fixture_db(databases.path(), "two.sqlite");

    Command::cargo_bin("schema-graph")
        .unwrap()
        .args(["batch", "--dir"])
        .arg(databases.path())
        .args(["--output-dir"])
        .arg(output.path())
        .assert()
        .success();

    assert!(output.path().join("one.json").is_file());
    assert!(output.path().join("two.json").is_file());
}
