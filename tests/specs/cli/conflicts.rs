// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for `fitsync conflicts`: detection, inspection, and resolution.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use yare::parameterized;

const LOCAL: &str = r#"{"id":"w1","reps":8,"updated_at":"2024-01-01T10:00:00Z"}"#;
const REMOTE: &str = r#"{"id":"w1","reps":12,"notes":"pr","updated_at":"2024-01-01T09:00:00Z"}"#;

fn fitsync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("fitsync");
    cmd.arg("--data-dir").arg(temp.path()).env_remove("FITSYNC_LOG");
    cmd
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

/// Initializes a data dir holding one `workouts/w1` conflict; returns its id.
fn init_with_conflict() -> (TempDir, String) {
    let temp = TempDir::new().unwrap();
    fitsync(&temp).arg("init").assert().success();
    let id = stdout(fitsync(&temp).args(["conflicts", "detect", "workouts", LOCAL, REMOTE, "-o", "id"]));
    (temp, id.trim().to_string())
}

#[test]
fn detect_prints_differences() {
    let temp = TempDir::new().unwrap();
    fitsync(&temp).arg("init").assert().success();

    fitsync(&temp)
        .args(["conflicts", "detect", "workouts", LOCAL, REMOTE])
        .assert()
        .success()
        .stdout(predicate::str::contains("Type: update_conflict"))
        .stdout(predicate::str::contains("reps (value_mismatch)"))
        .stdout(predicate::str::contains("notes (missing_local)"));
}

#[test]
fn detect_treats_equal_numbers_as_equal() {
    let temp = TempDir::new().unwrap();
    fitsync(&temp).arg("init").assert().success();

    fitsync(&temp)
        .args([
            "conflicts",
            "detect",
            "workouts",
            r#"{"id":"w1","reps":8,"weight":60}"#,
            r#"{"weight":60.0,"reps":8,"id":"w1"}"#,
        ])
        .assert()
        .success()
        .stdout("No conflict: both copies agree.\n");

    fitsync(&temp).args(["conflicts", "list"]).assert().success().stdout("No unresolved conflicts.\n");
}

#[test]
fn list_and_show() {
    let (temp, id) = init_with_conflict();

    fitsync(&temp)
        .args(["conflicts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("- {} workouts/w1 update_conflict (notes, reps, updated_at)", id)));

    fitsync(&temp).args(["conflicts", "list", "-e", "meals", "-o", "id"]).assert().success().stdout("");

    let conflict: Value =
        serde_json::from_str(&stdout(fitsync(&temp).args(["conflicts", "show", &id, "-o", "json"]))).unwrap();
    assert_eq!(conflict["entity_id"], "w1");
    assert_eq!(conflict["conflict_type"], "update_conflict");
}

#[parameterized(
    local = { "local_wins", json!(8) },
    remote = { "remote", json!(12) },
    merge_prefers_newer_local = { "merge", json!(8) },
)]
fn resolve_queues_update(strategy: &str, reps: Value) {
    let (temp, id) = init_with_conflict();

    let resolved: Value = serde_json::from_str(&stdout(
        fitsync(&temp).args(["conflicts", "resolve", &id, strategy, "-o", "json"]),
    ))
    .unwrap();
    assert_eq!(resolved["record"]["reps"], reps);

    let op: Value = serde_json::from_str(&stdout(
        fitsync(&temp).args(["show", resolved["operation_id"].as_str().unwrap(), "-o", "json"]),
    ))
    .unwrap();
    assert_eq!(op["type"], "UPDATE");
    assert_eq!(op["priority"], "high");
    assert_eq!(op["payload"], resolved["record"]);

    fitsync(&temp).args(["conflicts", "list"]).assert().success().stdout("No unresolved conflicts.\n");
    fitsync(&temp)
        .args(["conflicts", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("- {} workouts/w1", id)));
}

#[test]
fn merge_keeps_fields_present_on_one_side() {
    let (temp, id) = init_with_conflict();

    let record: Value = serde_json::from_str(&stdout(
        fitsync(&temp).args(["conflicts", "resolve", &id, "merge", "--preview"]),
    ))
    .unwrap();

    assert_eq!(record["notes"], "pr");
    assert_eq!(record["reps"], 8);
    assert_eq!(record["updated_at"], "2024-01-01T10:00:00Z");
    // Preview leaves the conflict in place.
    fitsync(&temp).args(["conflicts", "show", &id]).assert().success();
}

#[test]
fn manual_resolution_needs_matching_record() {
    let (temp, id) = init_with_conflict();

    fitsync(&temp)
        .args(["conflicts", "resolve", &id, "manual"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--record"));

    fitsync(&temp)
        .args(["conflicts", "resolve", &id, "manual", "--record", r#"{"id":"w2","reps":10}"#])
        .assert()
        .failure();

    fitsync(&temp)
        .args(["conflicts", "resolve", &id, "manual", "--record", r#"{"id":"w1","reps":10}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Resolved {} with manual", id)));
}

#[test]
fn resolving_twice_fails() {
    let (temp, id) = init_with_conflict();
    fitsync(&temp).args(["conflicts", "resolve", &id, "remote"]).assert().success();

    fitsync(&temp)
        .args(["conflicts", "resolve", &id, "remote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflict not found"));
}

#[test]
fn unknown_strategy_is_a_usage_error() {
    let (temp, id) = init_with_conflict();
    fitsync(&temp).args(["conflicts", "resolve", &id, "coinflip"]).assert().code(2);
}
