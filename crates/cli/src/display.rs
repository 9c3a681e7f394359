// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::DateTime;
use fitsync_core::{ConflictRecord, OpStatus, QueueStats, ResolvedConflict, SyncOperation};
use serde_json::Value;

/// Format epoch milliseconds as a UTC timestamp, falling back to the raw
/// number when it is out of range.
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Compact JSON, or `(absent)` when the field is missing on that side.
pub fn format_value(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "(absent)".to_string(),
    }
}

fn target(op: &SyncOperation) -> String {
    match &op.entity_id {
        Some(id) => format!("{}/{}", op.entity, id),
        None => op.entity.clone(),
    }
}

/// Format an operation as a single line.
///
/// ```text
/// - [high] op-1a2b3c4d5e6f7a8b UPDATE workouts/w1 (pending, retry 1/3)
/// ```
pub fn format_operation_line(op: &SyncOperation) -> String {
    let mut state = op.status.to_string();
    if op.retry_count > 0 {
        state.push_str(&format!(", retry {}/{}", op.retry_count, op.max_retries));
    }
    format!("- [{}] {} {} {} ({})", op.priority, op.id, op.op_type, target(op), state)
}

pub fn format_operation_details(op: &SyncOperation) -> String {
    let mut out = String::new();
    out.push_str(&format!("[{}] {}\n", op.priority, op.id));
    out.push_str(&format!("Type: {}\n", op.op_type));
    out.push_str(&format!("Target: {}\n", target(op)));
    out.push_str(&format!("Status: {}\n", op.status));
    out.push_str(&format!("Retries: {}/{}\n", op.retry_count, op.max_retries));
    out.push_str(&format!("Enqueued: {}\n", format_timestamp(op.enqueued_at)));
    out.push_str(&format!("Updated: {}\n", format_timestamp(op.updated_at)));
    if let Some(at) = op.next_retry_at {
        out.push_str(&format!("Next retry: {}\n", format_timestamp(at)));
    }
    if let Some(error) = &op.last_error {
        out.push_str(&format!("Last error: {}\n", error));
    }
    if op.status == OpStatus::Failed && op.has_retries_left() {
        out.push_str("  hint: run 'fitsync retry' to queue it again\n");
    }
    out.push_str(&format!("\nPayload:\n    {}\n", op.payload));
    out
}

pub fn format_stats(stats: &QueueStats) -> String {
    format!(
        "pending: {}\nprocessing: {}\ncompleted: {}\nfailed: {}\ntotal: {}\n",
        stats.pending, stats.processing, stats.completed, stats.failed, stats.total
    )
}

/// Format a conflict as a single line listing its diverging fields.
pub fn format_conflict_line(conflict: &ConflictRecord) -> String {
    format!(
        "- {} {}/{} {} ({})",
        conflict.id,
        conflict.entity,
        conflict.entity_id,
        conflict.conflict_type,
        conflict.fields().join(", ")
    )
}

pub fn format_conflict_details(conflict: &ConflictRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}/{}\n", conflict.id, conflict.entity, conflict.entity_id));
    out.push_str(&format!("Type: {}\n", conflict.conflict_type));
    out.push_str(&format!("Detected: {}\n", format_timestamp(conflict.detected_at)));
    if let Some(ts) = conflict.local_timestamp {
        out.push_str(&format!("Local updated: {}\n", format_timestamp(ts)));
    }
    if let Some(ts) = conflict.remote_timestamp {
        out.push_str(&format!("Remote updated: {}\n", format_timestamp(ts)));
    }

    out.push_str("\nDifferences:\n");
    for diff in &conflict.differences {
        out.push_str(&format!("  {} ({})\n", diff.field, diff.kind));
        out.push_str(&format!("    local:  {}\n", format_value(diff.local_value.as_ref())));
        out.push_str(&format!("    remote: {}\n", format_value(diff.remote_value.as_ref())));
    }
    out
}

pub fn format_resolution_line(resolved: &ResolvedConflict) -> String {
    format!(
        "- {} {}/{} {} -> {} at {}",
        resolved.conflict.id,
        resolved.conflict.entity,
        resolved.conflict.entity_id,
        resolved.strategy,
        resolved.operation_id,
        format_timestamp(resolved.resolved_at)
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
