// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use fitsync_core::{ConflictType, Difference, DifferenceKind, OpType, Priority};
use serde_json::json;
use yare::parameterized;

fn operation() -> SyncOperation {
    SyncOperation::new(
        "op-0000000000000001".to_string(),
        OpType::Update,
        "workouts".to_string(),
        json!({"id": "w1", "reps": 10}),
        Priority::High,
        3,
        1_704_067_200_000,
    )
}

#[parameterized(
    epoch = { 0, "1970-01-01 00:00:00" },
    new_year = { 1_704_067_200_000, "2024-01-01 00:00:00" },
    with_millis = { 1_704_067_205_999, "2024-01-01 00:00:05" },
    out_of_range = { u64::MAX, "18446744073709551615" },
)]
fn timestamps(ms: u64, expected: &str) {
    assert_eq!(format_timestamp(ms), expected);
}

#[test]
fn operation_line_shows_retry_state_only_after_a_retry() {
    let mut op = operation();
    assert_eq!(
        format_operation_line(&op),
        "- [high] op-0000000000000001 UPDATE workouts/w1 (pending)"
    );

    op.retry_count = 1;
    assert!(format_operation_line(&op).ends_with("(pending, retry 1/3)"));
}

#[test]
fn operation_without_entity_id_shows_entity_only() {
    let op = SyncOperation::new(
        "op-0000000000000002".to_string(),
        OpType::Create,
        "settings".to_string(),
        json!({"theme": "dark"}),
        Priority::Low,
        3,
        0,
    );
    assert!(format_operation_line(&op).contains("CREATE settings ("));
}

#[test]
fn failed_operation_details_include_error_and_hint() {
    let mut op = operation();
    op.status = OpStatus::Failed;
    op.last_error = Some("unauthorized".to_string());

    let details = format_operation_details(&op);
    assert!(details.contains("Status: failed"));
    assert!(details.contains("Last error: unauthorized"));
    assert!(details.contains("fitsync retry"));
    assert!(details.contains("{\"id\":\"w1\",\"reps\":10}"));
}

#[test]
fn conflict_output_lists_field_differences() {
    let conflict = ConflictRecord {
        id: "cf-0000000000000001".to_string(),
        entity: "workouts".to_string(),
        entity_id: "w1".to_string(),
        local_data: json!({"id": "w1", "reps": 8}),
        remote_data: json!({"id": "w1", "reps": 12, "notes": "pr"}),
        local_timestamp: None,
        remote_timestamp: Some(1_704_067_200_000),
        conflict_type: ConflictType::UpdateConflict,
        differences: vec![
            Difference {
                field: "notes".to_string(),
                local_value: None,
                remote_value: Some(json!("pr")),
                kind: DifferenceKind::MissingLocal,
            },
            Difference {
                field: "reps".to_string(),
                local_value: Some(json!(8)),
                remote_value: Some(json!(12)),
                kind: DifferenceKind::ValueMismatch,
            },
        ],
        detected_at: 1_704_067_200_000,
    };

    assert_eq!(
        format_conflict_line(&conflict),
        "- cf-0000000000000001 workouts/w1 update_conflict (notes, reps)"
    );

    let details = format_conflict_details(&conflict);
    assert!(details.contains("Remote updated: 2024-01-01 00:00:00"));
    assert!(!details.contains("Local updated"));
    assert!(details.contains("    local:  (absent)"));
    assert!(details.contains("    remote: 12"));
}
