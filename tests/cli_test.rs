//! CLI integration tests.
//!
//! Tests:
//! - Help and version output
//! - Add, count, show, rename and remove against a temporary database

use std::process::{Command, Output};

fn modelflow(db: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modelflow"))
        .arg("--db")
        .arg(db)
        .args(args)
        .env_remove("MODELFLOW_DB")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run modelflow")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_cli_help_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_modelflow"))
        .arg("--help")
        .output()
        .expect("failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);

    for option in ["--db", "--log-level", "--pool-size", "--queue-size", "--output"] {
        assert!(stdout.contains(option), "help should mention {option}");
    }
    assert!(stdout.contains("modelflow"), "help should mention modelflow");
}

#[test]
fn test_cli_version_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_modelflow"))
        .arg("--version")
        .output()
        .expect("failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "version output should contain version number: {}",
        stdout
    );
}

#[test]
fn test_cli_note_lifecycle() {
    let temp_dir = tempfile::TempDir::new().expect("failed to create temp dir");
    let db = temp_dir.path().join("nested").join("notes.db");

    let added = stdout(&modelflow(&db, &["add", "first", "second"]));
    assert!(added.contains("Added #1: first"));
    assert!(added.contains("Added #2: second"));

    assert_eq!(stdout(&modelflow(&db, &["count"])).trim(), "2");

    let renamed = stdout(&modelflow(&db, &["rename", "1", "primero"]));
    assert!(renamed.contains("update: 1 of 1 note(s) changed"));
    assert!(stdout(&modelflow(&db, &["show", "1"])).contains("#1: primero"));

    let removed = stdout(&modelflow(&db, &["remove", "2", "7"]));
    assert!(removed.contains("delete: 1 of 2 note(s) changed"));
    assert!(stdout(&modelflow(&db, &["show", "2"])).contains("No note #2."));
}

#[test]
fn test_cli_json_list() {
    let temp_dir = tempfile::TempDir::new().expect("failed to create temp dir");
    let db = temp_dir.path().join("notes.db");

    stdout(&modelflow(&db, &["add", "only"]));
    let listed = stdout(&modelflow(&db, &["--output", "json", "list"]));
    let value: serde_json::Value = serde_json::from_str(&listed).expect("invalid json");

    assert_eq!(value["total"], 1);
    assert_eq!(value["notes"][0]["title"], "only");
}

#[test]
fn test_cli_rejects_empty_title() {
    let temp_dir = tempfile::TempDir::new().expect("failed to create temp dir");
    let db = temp_dir.path().join("notes.db");

    let output = modelflow(&db, &["add", "kept", ""]);
    assert!(!output.status.success());

    // The whole batch ran in one transaction
    assert_eq!(stdout(&modelflow(&db, &["count"])).trim(), "0");
}
