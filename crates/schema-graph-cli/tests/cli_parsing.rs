//! Argument-parsing tests driving the compiled binary with `--help`/invalid
//! input, since `Cli` itself is private to the binary crate.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_all_subcommands() {
    Command::cargo_bin("schema-graph")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn build_requires_db_argument() {
    Command::cargo_bin("schema-graph")
        .unwrap()
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--db"));
}

#[test]
fn validate_requires_artifact_argument() {
    Command::cargo_bin("schema-graph")
        .unwrap()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--artifact"));
}

#[test]
fn batch_requires_dir_and_output_dir() {
    Command::cargo_bin("schema-graph")
        .unwrap()
        .arg("batch")
        .assert()
        .failure();
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("schema-graph")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}
