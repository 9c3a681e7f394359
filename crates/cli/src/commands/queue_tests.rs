// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::testing::TestContext;
use crate::error::Error;
use serde_json::json;

const HOUR_MS: u64 = 3_600_000;

fn fail(ctx: &TestContext, id: &str) {
    ctx.queue.mark_processing(id).unwrap();
    ctx.queue.mark_failed(id, "unauthorized").unwrap();
}

#[test]
fn add_queues_operation_with_overrides() {
    let ctx = TestContext::new();

    add(&ctx, OpType::Update, "workouts", r#"{"id":"w1","reps":10}"#, Some(Priority::High), Some(5), OutputFormat::Id)
        .unwrap();

    let ops = ctx.queue.get_pending_operations().unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].op_type, OpType::Update);
    assert_eq!(ops[0].entity_id.as_deref(), Some("w1"));
    assert_eq!(ops[0].priority, Priority::High);
    assert_eq!(ops[0].max_retries, 5);
}

#[test]
fn add_rejects_non_object_payload() {
    let ctx = TestContext::new();

    let err = add(&ctx, OpType::Create, "workouts", "[1]", None, None, OutputFormat::Text).unwrap_err();

    assert!(matches!(err, Error::InvalidJson { what: "payload", .. }));
    assert!(ctx.queue.all_operations().unwrap().is_empty());
}

#[test]
fn add_rejects_blank_entity() {
    let ctx = TestContext::new();

    let err = add(&ctx, OpType::Create, "  ", "{}", None, None, OutputFormat::Text).unwrap_err();
    assert!(matches!(err, Error::Core(fitsync_core::Error::InvalidInput(_))));
}

#[test]
fn listing_commands_succeed_on_empty_queue() {
    let ctx = TestContext::new();
    for output in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Id] {
        pending(&ctx, output).unwrap();
        list(&ctx, &[], output).unwrap();
        stats(&ctx, output).unwrap();
    }
}

#[test]
fn show_unknown_operation_is_not_found() {
    let ctx = TestContext::new();
    let err = show(&ctx, "op-missing", OutputFormat::Text).unwrap_err();
    assert!(matches!(err, Error::Core(fitsync_core::Error::OperationNotFound(id)) if id == "op-missing"));
}

#[test]
fn cleanup_defaults_to_configured_retention() {
    let ctx = TestContext::new();
    let id = ctx.enqueue(OpType::Create, "workouts", json!({"id": "w1"}));
    ctx.queue.mark_processing(&id).unwrap();
    ctx.queue.mark_completed(&id).unwrap();

    ctx.clock.advance(ctx.config.queue.retention_hours * HOUR_MS - 1);
    cleanup(&ctx, None).unwrap();
    assert!(ctx.queue.get(&id).unwrap().is_some());

    ctx.clock.advance(2);
    cleanup(&ctx, None).unwrap();
    assert!(ctx.queue.get(&id).unwrap().is_none());
}

#[test]
fn cleanup_override_keeps_outstanding_operations() {
    let ctx = TestContext::new();
    let pending_id = ctx.enqueue(OpType::Create, "workouts", json!({"id": "w1"}));
    let done = ctx.enqueue(OpType::Create, "workouts", json!({"id": "w2"}));
    ctx.queue.mark_processing(&done).unwrap();
    ctx.queue.mark_completed(&done).unwrap();
    ctx.clock.advance(HOUR_MS + 1);

    cleanup(&ctx, Some(1)).unwrap();

    assert!(ctx.queue.get(&done).unwrap().is_none());
    assert!(ctx.queue.get(&pending_id).unwrap().is_some());
}

#[test]
fn recover_requeues_processing_operations() {
    let ctx = TestContext::new();
    let id = ctx.enqueue(OpType::Update, "workouts", json!({"id": "w1"}));
    ctx.queue.mark_processing(&id).unwrap();

    recover(&ctx).unwrap();

    assert_eq!(ctx.queue.get(&id).unwrap().unwrap().status, OpStatus::Pending);
}

#[test]
fn retry_queues_a_copy_and_keeps_the_failed_original() {
    let ctx = TestContext::new();
    let id = ctx.enqueue(OpType::Delete, "meals", json!({"id": "m1"}));
    fail(&ctx, &id);

    retry(&ctx, &id, OutputFormat::Text).unwrap();

    assert_eq!(ctx.queue.get(&id).unwrap().unwrap().status, OpStatus::Failed);
    let pending = ctx.queue.get_operations_by_status(OpStatus::Pending).unwrap();
    assert_eq!(pending.len(), 1);
    assert_ne!(pending[0].id, id);
    assert_eq!(pending[0].payload, json!({"id": "m1"}));
}

#[test]
fn retry_of_pending_operation_is_rejected() {
    let ctx = TestContext::new();
    let id = ctx.enqueue(OpType::Create, "workouts", json!({"id": "w1"}));

    let err = retry(&ctx, &id, OutputFormat::Text).unwrap_err();
    assert!(matches!(err, Error::Core(fitsync_core::Error::InvalidTransition { .. })));
}

#[test]
fn remove_deletes_and_reports_missing() {
    let ctx = TestContext::new();
    let id = ctx.enqueue(OpType::Create, "workouts", json!({"id": "w1"}));

    remove(&ctx, &id).unwrap();
    assert!(ctx.queue.get(&id).unwrap().is_none());

    let err = remove(&ctx, &id).unwrap_err();
    assert!(matches!(err, Error::Core(fitsync_core::Error::OperationNotFound(_))));
}
