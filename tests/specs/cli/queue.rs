// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the queue commands: `add`, `pending`, `list`, `stats`,
//! `show`, `cleanup`, `recover`, `retry`, and `remove`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use yare::parameterized;

fn fitsync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("fitsync");
    cmd.arg("--data-dir").arg(temp.path()).env_remove("FITSYNC_LOG");
    cmd
}

fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    fitsync(&temp).arg("init").assert().success();
    temp
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

/// Queues an operation and returns its id.
fn add(temp: &TempDir, args: &[&str]) -> String {
    stdout(fitsync(temp).arg("add").args(args).args(["-o", "id"])).trim().to_string()
}

fn json(temp: &TempDir, args: &[&str]) -> Value {
    serde_json::from_str(&stdout(fitsync(temp).args(args).args(["-o", "json"]))).unwrap()
}

#[test]
fn add_prints_queued_operation() {
    let temp = init_temp();

    fitsync(&temp)
        .args(["add", "update", "workouts", r#"{"id":"w1","reps":10}"#, "-p", "high"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued [high]"))
        .stdout(predicate::str::contains("UPDATE workouts/w1 (pending)"));
}

#[test]
fn add_uses_configured_defaults() {
    let temp = init_temp();
    let id = add(&temp, &["create", "meals", r#"{"id":"m1"}"#]);

    let op = json(&temp, &["show", &id]);
    assert_eq!(op["priority"], "medium");
    assert_eq!(op["max_retries"], 3);
    assert_eq!(op["retry_count"], 0);
    assert_eq!(op["status"], "pending");
}

#[parameterized(
    array = { "[1,2]" },
    malformed = { "{id:" },
    scalar = { "42" },
)]
fn add_rejects_payloads_that_are_not_objects(payload: &str) {
    let temp = init_temp();

    fitsync(&temp)
        .args(["add", "create", "workouts", payload])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid payload"));

    fitsync(&temp).args(["pending", "-o", "id"]).assert().success().stdout("");
}

#[parameterized(
    op_type = { &["add", "upsert", "workouts", "{}"] },
    priority = { &["add", "create", "workouts", "{}", "-p", "urgent"] },
    status = { &["list", "-s", "done"] },
)]
fn invalid_values_are_usage_errors(args: &[&str]) {
    let temp = init_temp();
    fitsync(&temp).args(args).assert().code(2);
}

#[test]
fn pending_orders_by_priority_then_age() {
    let temp = init_temp();
    let low = add(&temp, &["create", "workouts", r#"{"id":"w1"}"#, "-p", "low"]);
    let medium = add(&temp, &["create", "workouts", r#"{"id":"w2"}"#]);
    let high = add(&temp, &["create", "workouts", r#"{"id":"w3"}"#, "-p", "high"]);

    let ids = stdout(fitsync(&temp).args(["pending", "-o", "id"]));
    let ids: Vec<&str> = ids.lines().collect();
    assert_eq!(ids, vec![high.as_str(), medium.as_str(), low.as_str()]);
}

#[test]
fn empty_queue_messages() {
    let temp = init_temp();

    fitsync(&temp).arg("pending").assert().success().stdout("No pending operations.\n");
    fitsync(&temp).arg("list").assert().success().stdout("No operations.\n");
    assert_eq!(json(&temp, &["pending"]), serde_json::json!([]));
}

#[test]
fn stats_count_by_status() {
    let temp = init_temp();
    add(&temp, &["create", "workouts", r#"{"id":"w1"}"#]);
    add(&temp, &["delete", "workouts", r#"{"id":"w2"}"#]);

    let stats = json(&temp, &["stats"]);
    assert_eq!(stats["pending"], 2);
    assert_eq!(stats["failed"], 0);
    assert_eq!(stats["total"], 2);

    fitsync(&temp).arg("stats").assert().success().stdout(predicate::str::contains("pending: 2"));
}

#[test]
fn list_filters_by_status() {
    let temp = init_temp();
    add(&temp, &["create", "workouts", r#"{"id":"w1"}"#]);

    fitsync(&temp).args(["list", "-s", "pending", "-o", "id"]).assert().success().stdout(predicate::str::is_empty().not());
    fitsync(&temp).args(["list", "-s", "failed", "-s", "completed"]).assert().success().stdout("No operations.\n");
}

#[test]
fn show_reports_details_and_missing_ids() {
    let temp = init_temp();
    let id = add(&temp, &["update", "profile", r#"{"id":"u1","name":"Sam"}"#]);

    fitsync(&temp)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Type: UPDATE"))
        .stdout(predicate::str::contains("Target: profile/u1"))
        .stdout(predicate::str::contains(r#""name":"Sam""#));

    fitsync(&temp)
        .args(["show", "op-missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("operation not found: op-missing"));
}

#[test]
fn remove_deletes_operation() {
    let temp = init_temp();
    let id = add(&temp, &["create", "workouts", r#"{"id":"w1"}"#]);

    fitsync(&temp).args(["remove", &id]).assert().success();
    fitsync(&temp).args(["show", &id]).assert().failure();
    fitsync(&temp).args(["remove", &id]).assert().failure();
}

#[test]
fn retry_requires_a_failed_operation() {
    let temp = init_temp();
    let id = add(&temp, &["create", "workouts", r#"{"id":"w1"}"#]);

    fitsync(&temp)
        .args(["retry", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid status transition"));
}

#[test]
fn recover_and_cleanup_on_fresh_queue() {
    let temp = init_temp();
    add(&temp, &["create", "workouts", r#"{"id":"w1"}"#]);

    fitsync(&temp).arg("recover").assert().success().stdout("Nothing to recover.\n");
    fitsync(&temp)
        .args(["cleanup", "--older-than", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 completed operation(s)"));
    assert_eq!(json(&temp, &["stats"])["pending"], 1);
}

#[test]
fn queue_survives_restarts() {
    let temp = init_temp();
    let id = add(&temp, &["create", "workouts", r#"{"id":"w1"}"#]);

    let ops = json(&temp, &["list"]);
    assert_eq!(ops.as_array().unwrap().len(), 1);
    assert_eq!(ops[0]["id"], id.as_str());
    assert_eq!(ops[0]["payload"], serde_json::json!({"id": "w1"}));
}
