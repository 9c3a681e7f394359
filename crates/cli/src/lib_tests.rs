// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use clap::Parser;
use fitsync_core::OpStatus;
use tempfile::TempDir;

fn run_args(dir: &Path, args: &[&str]) -> Result<()> {
    let mut argv = vec!["fitsync", "--data-dir", dir.to_str().unwrap()];
    argv.extend_from_slice(args);
    run(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn commands_before_init_report_not_initialized() {
    let temp = TempDir::new().unwrap();
    let err = run_args(temp.path(), &["pending"]).unwrap_err();
    assert!(matches!(err, Error::NotInitialized(_)));
    assert!(err.to_string().contains("fitsync init"));
}

#[test]
fn config_path_works_before_init() {
    let temp = TempDir::new().unwrap();
    assert!(run_args(temp.path(), &["config", "path"]).is_ok());
}

#[test]
fn queued_operations_persist_across_runs() {
    let temp = TempDir::new().unwrap();
    run_args(temp.path(), &["init"]).unwrap();
    run_args(temp.path(), &["add", "create", "workouts", r#"{"id":"w1"}"#, "-p", "high"]).unwrap();

    let ctx = Context::open(temp.path()).unwrap();
    let ops = ctx.queue.get_operations_by_status(OpStatus::Pending).unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].entity, "workouts");
}

#[test]
fn detected_conflict_can_be_resolved_in_a_later_run() {
    let temp = TempDir::new().unwrap();
    run_args(temp.path(), &["init"]).unwrap();
    run_args(
        temp.path(),
        &["conflicts", "detect", "workouts", r#"{"id":"w1","reps":8}"#, r#"{"id":"w1","reps":12}"#],
    )
    .unwrap();
    let id = Context::open(temp.path()).unwrap().conflicts.list().unwrap()[0].id.clone();

    run_args(temp.path(), &["conflicts", "resolve", &id, "remote"]).unwrap();

    let ctx = Context::open(temp.path()).unwrap();
    assert!(ctx.conflicts.is_empty().unwrap());
    assert_eq!(ctx.conflicts.history().unwrap().len(), 1);
    assert_eq!(ctx.queue.stats().unwrap().pending, 1);
}
