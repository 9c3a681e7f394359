// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutations awaiting delivery to the remote backend.
//!
//! Every local create/update/delete is recorded as a [`SyncOperation`] and
//! persisted before anything touches the network. Operations carry their own
//! retry state; only the queue processor moves them between statuses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of mutation carried by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpType {
    Create,
    Update,
    Delete,
}

impl OpType {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::Create => "CREATE",
            OpType::Update => "UPDATE",
            OpType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(OpType::Create),
            "update" => Ok(OpType::Update),
            "delete" => Ok(OpType::Delete),
            _ => Err(Error::InvalidOpType(s.to_string())),
        }
    }
}

/// Dequeue priority. Ordered so that `High > Medium > Low`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(Error::InvalidPriority(s.to_string())),
        }
    }
}

/// Lifecycle status of an operation.
///
/// ```text
/// pending ──► processing ──► completed
///    ▲            │
///    └── retry ───┤
///                 └────────► failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    /// Waiting to be dispatched (possibly until `next_retry_at`).
    Pending,
    /// Handed to the remote executor.
    Processing,
    /// Delivered successfully. Terminal.
    Completed,
    /// Given up on. Terminal.
    Failed,
}

impl OpStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpStatus::Pending => "pending",
            OpStatus::Processing => "processing",
            OpStatus::Completed => "completed",
            OpStatus::Failed => "failed",
        }
    }

    /// Returns true for statuses the processor never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OpStatus::Completed | OpStatus::Failed)
    }

    /// Check if a transition from this status to target is valid.
    pub fn can_transition_to(&self, target: OpStatus) -> bool {
        matches!(
            (self, target),
            (OpStatus::Pending, OpStatus::Processing)
                | (OpStatus::Processing, OpStatus::Completed)
                | (OpStatus::Processing, OpStatus::Pending)
                | (OpStatus::Processing, OpStatus::Failed)
        )
    }
}

impl fmt::Display for OpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OpStatus::Pending),
            "processing" => Ok(OpStatus::Processing),
            "completed" => Ok(OpStatus::Completed),
            "failed" => Ok(OpStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A durable, retryable mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    /// Opaque identifier generated at enqueue time.
    pub id: String,
    #[serde(rename = "type")]
    pub op_type: OpType,
    /// Logical table the payload belongs to (e.g. "workouts").
    pub entity: String,
    /// Identity of the affected record, taken from the payload's `id` field.
    #[serde(default)]
    pub entity_id: Option<String>,
    pub payload: Value,
    /// Enqueue time in ms. Never changes.
    pub enqueued_at: u64,
    /// Position in enqueue order, assigned by the queue. Breaks ties between
    /// operations enqueued in the same millisecond.
    #[serde(default)]
    pub seq: u64,
    pub priority: Priority,
    pub retry_count: u32,
    pub max_retries: u32,
    pub status: OpStatus,
    #[serde(default)]
    pub last_error: Option<String>,
    /// Not eligible for dispatch before this time (ms).
    #[serde(default)]
    pub next_retry_at: Option<u64>,
    /// Last status change (ms).
    #[serde(default)]
    pub updated_at: u64,
}

impl SyncOperation {
    /// Creates a fresh `pending` operation with no retry history.
    pub fn new(
        id: String,
        op_type: OpType,
        entity: String,
        payload: Value,
        priority: Priority,
        max_retries: u32,
        now_ms: u64,
    ) -> Self {
        let entity_id = entity_id_of(&payload);
        SyncOperation {
            id,
            op_type,
            entity,
            entity_id,
            payload,
            enqueued_at: now_ms,
            seq: 0,
            priority,
            retry_count: 0,
            max_retries,
            status: OpStatus::Pending,
            last_error: None,
            next_retry_at: None,
            updated_at: now_ms,
        }
    }

    /// Returns true if the processor may dispatch this operation at `now_ms`.
    pub fn is_ready(&self, now_ms: u64) -> bool {
        self.status == OpStatus::Pending && self.next_retry_at.is_none_or(|at| at <= now_ms)
    }

    /// Returns true if the operation still has retry budget left.
    pub fn has_retries_left(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Returns true for operations still counted as outstanding work:
    /// pending ones, and failed ones that never exhausted their budget.
    pub fn is_outstanding(&self) -> bool {
        match self.status {
            OpStatus::Pending => true,
            OpStatus::Failed => self.has_retries_left(),
            OpStatus::Processing | OpStatus::Completed => false,
        }
    }

    /// Key used to serialize operations that touch the same record.
    pub fn entity_key(&self) -> Option<(&str, &str)> {
        self.entity_id.as_deref().map(|id| (self.entity.as_str(), id))
    }
}

/// Dispatch order: higher priority first, then oldest first.
pub fn dispatch_order(a: &SyncOperation, b: &SyncOperation) -> std::cmp::Ordering {
    b.priority.cmp(&a.priority).then_with(|| enqueue_order(a, b))
}

/// Enqueue order: `enqueued_at`, then `seq`. `id` only separates records
/// written before `seq` existed.
pub fn enqueue_order(a: &SyncOperation, b: &SyncOperation) -> std::cmp::Ordering {
    (a.enqueued_at, a.seq, &a.id).cmp(&(b.enqueued_at, b.seq, &b.id))
}

/// Extract the record identity from a payload's `id` field.
pub fn entity_id_of(payload: &Value) -> Option<String> {
    record_id(payload, "id")
}

/// Extract a record identity from `field`.
///
/// Numeric ids are rendered as strings; anything else yields `None`.
pub fn record_id(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Aggregate operation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

impl QueueStats {
    /// Builds counts from a list of operations.
    pub fn from_operations<'a>(ops: impl IntoIterator<Item = &'a SyncOperation>) -> Self {
        let mut stats = QueueStats::default();
        for op in ops {
            match op.status {
                OpStatus::Pending => stats.pending += 1,
                OpStatus::Processing => stats.processing += 1,
                OpStatus::Completed => stats.completed += 1,
                OpStatus::Failed => stats.failed += 1,
            }
            stats.total += 1;
        }
        stats
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
