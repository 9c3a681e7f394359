// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::testing::TestContext;
use fitsync_core::{DurableStore, OpStatus, OpType, Priority};
use serde_json::json;
use yare::parameterized;

#[test]
fn detect_records_a_conflict_for_diverging_copies() {
    let ctx = TestContext::new();

    detect(&ctx, "workouts", r#"{"id":"w1","reps":8}"#, r#"{"id":"w1","reps":12}"#, OutputFormat::Id).unwrap();

    let conflict = ctx.conflicts.find("workouts", "w1").unwrap().unwrap();
    assert_eq!(conflict.fields(), vec!["reps"]);
}

#[test]
fn detect_agreeing_copies_records_nothing() {
    let ctx = TestContext::new();

    detect(&ctx, "workouts", r#"{"id":"w1","reps":8}"#, r#"{"reps":8,"id":"w1"}"#, OutputFormat::Text).unwrap();

    assert!(ctx.conflicts.is_empty().unwrap());
}

#[test]
fn detect_again_replaces_the_earlier_conflict() {
    let ctx = TestContext::new();
    let first = ctx.conflict("w1", 8, 12);

    detect(&ctx, "workouts", r#"{"id":"w1","reps":9}"#, r#"{"id":"w1","reps":12}"#, OutputFormat::Id).unwrap();

    assert_eq!(ctx.conflicts.len().unwrap(), 1);
    assert!(ctx.conflicts.get(&first).unwrap().is_none());
}

#[test]
fn list_filters_by_entity() {
    let ctx = TestContext::new();
    ctx.conflict("w1", 8, 12);
    let other = ctx.detector.detect("meals", &json!({"id": "m1", "kcal": 500}), &json!({"id": "m1", "kcal": 450})).unwrap().unwrap();
    ctx.conflicts.record(&other).unwrap();

    list(&ctx, Some("meals"), OutputFormat::Id).unwrap();
    assert_eq!(ctx.conflicts.list_for_entity("meals").unwrap().len(), 1);
    assert_eq!(ctx.conflicts.list().unwrap().len(), 2);
}

#[test]
fn show_unknown_conflict_is_not_found() {
    let ctx = TestContext::new();
    let err = show(&ctx, "cf-missing", OutputFormat::Text).unwrap_err();
    assert!(matches!(err, Error::Core(fitsync_core::Error::ConflictNotFound(_))));
}

#[parameterized(
    local = { ResolutionKind::LocalWins, 8 },
    remote = { ResolutionKind::RemoteWins, 12 },
    merge_without_timestamps_prefers_remote = { ResolutionKind::Merge, 12 },
)]
fn resolve_writes_record_and_queues_update(strategy: ResolutionKind, expected_reps: u32) {
    let ctx = TestContext::new();
    let id = ctx.conflict("w1", 8, 12);

    resolve(&ctx, &id, strategy, None, false, OutputFormat::Text).unwrap();

    let stored = ctx.queue.store().get("workouts", "w1").unwrap().unwrap();
    assert_eq!(stored["reps"], json!(expected_reps));

    let ops = ctx.queue.get_operations_by_status(OpStatus::Pending).unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].op_type, OpType::Update);
    assert_eq!(ops[0].priority, Priority::High);
    assert_eq!(ops[0].payload, stored);

    assert!(ctx.conflicts.is_empty().unwrap());
    assert_eq!(ctx.conflicts.history().unwrap()[0].strategy, strategy);
}

#[test]
fn preview_has_no_side_effects() {
    let ctx = TestContext::new();
    let id = ctx.conflict("w1", 8, 12);

    resolve(&ctx, &id, ResolutionKind::Merge, None, true, OutputFormat::Text).unwrap();

    assert!(ctx.conflicts.get(&id).unwrap().is_some());
    assert!(ctx.queue.all_operations().unwrap().is_empty());
    assert!(ctx.queue.store().get("workouts", "w1").unwrap().is_none());
}

#[test]
fn manual_requires_a_record() {
    let ctx = TestContext::new();
    let id = ctx.conflict("w1", 8, 12);

    let err = resolve(&ctx, &id, ResolutionKind::Manual, None, false, OutputFormat::Text).unwrap_err();
    assert!(matches!(err, Error::RecordRequired));
}

#[test]
fn manual_record_for_another_entity_is_rejected() {
    let ctx = TestContext::new();
    let id = ctx.conflict("w1", 8, 12);

    let err = resolve(&ctx, &id, ResolutionKind::Manual, Some(r#"{"id":"w2","reps":10}"#), false, OutputFormat::Text)
        .unwrap_err();

    assert!(matches!(err, Error::Core(fitsync_core::Error::EntityMismatch { .. })));
    assert!(ctx.conflicts.get(&id).unwrap().is_some());
}

#[test]
fn manual_record_is_applied() {
    let ctx = TestContext::new();
    let id = ctx.conflict("w1", 8, 12);

    resolve(&ctx, &id, ResolutionKind::Manual, Some(r#"{"id":"w1","reps":10}"#), false, OutputFormat::Id).unwrap();

    assert_eq!(ctx.queue.store().get("workouts", "w1").unwrap(), Some(json!({"id": "w1", "reps": 10})));
    history(&ctx, OutputFormat::Text).unwrap();
}

#[test]
fn other_strategies_refuse_a_record() {
    let ctx = TestContext::new();
    let id = ctx.conflict("w1", 8, 12);

    let err = resolve(&ctx, &id, ResolutionKind::LocalWins, Some(r#"{"id":"w1"}"#), false, OutputFormat::Text)
        .unwrap_err();
    assert!(matches!(err, Error::Core(fitsync_core::Error::InvalidInput(_))));
}
