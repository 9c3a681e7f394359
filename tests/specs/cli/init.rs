// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for `fitsync init`, `fitsync config`, and data directory
//! resolution.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use yare::parameterized;

fn fitsync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("fitsync");
    cmd.arg("--data-dir").arg(temp.path()).env_remove("FITSYNC_LOG");
    cmd
}

#[test]
fn init_creates_config_and_database() {
    let temp = TempDir::new().unwrap();

    fitsync(&temp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized fitsync"));

    assert!(temp.path().join("config.toml").is_file());
    assert!(temp.path().join("sync.db").is_file());
}

#[test]
fn init_twice_fails_with_hint() {
    let temp = TempDir::new().unwrap();
    fitsync(&temp).arg("init").assert().success();

    fitsync(&temp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"))
        .stderr(predicate::str::contains("--force"));

    fitsync(&temp).args(["init", "--force"]).assert().success();
}

#[test]
fn data_dir_from_environment() {
    let temp = TempDir::new().unwrap();

    cargo_bin_cmd!("fitsync").env("FITSYNC_DATA_DIR", temp.path()).arg("init").assert().success();

    assert!(temp.path().join("config.toml").is_file());
}

#[parameterized(
    pending = { &["pending"] },
    stats = { &["stats"] },
    conflicts = { &["conflicts", "list"] },
    config_show = { &["config", "show"] },
)]
fn commands_require_init(args: &[&str]) {
    let temp = TempDir::new().unwrap();

    fitsync(&temp)
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: not initialized"))
        .stderr(predicate::str::contains("fitsync init"));
}

#[test]
fn config_path_points_into_data_dir() {
    let temp = TempDir::new().unwrap();

    fitsync(&temp)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show_prints_defaults() {
    let temp = TempDir::new().unwrap();
    fitsync(&temp).arg("init").assert().success();

    fitsync(&temp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[retry]"))
        .stdout(predicate::str::contains("max_delay_ms"));

    let output = fitsync(&temp).args(["config", "show", "-o", "json"]).output().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value["processor"]["batch_size"].is_number());
}

#[test]
fn invalid_config_is_reported_with_path() {
    let temp = TempDir::new().unwrap();
    fitsync(&temp).arg("init").assert().success();
    std::fs::write(temp.path().join("config.toml"), "[processor]\nbatch_size = 0\n").unwrap();

    fitsync(&temp)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"))
        .stderr(predicate::str::contains("config.toml"));
}

#[parameterized(
    bash = { "bash" },
    zsh = { "zsh" },
    fish = { "fish" },
)]
fn completion_scripts_mention_binary(shell: &str) {
    cargo_bin_cmd!("fitsync")
        .args(["completion", shell])
        .assert()
        .success()
        .stdout(predicate::str::contains("fitsync"));
}

#[test]
fn version_flag() {
    cargo_bin_cmd!("fitsync")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("fitsync "));
}
