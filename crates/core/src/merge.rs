// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field-level merging of conflicting records.
//!
//! Merge rules:
//! - Fields equal on both sides are kept as-is
//! - Fields present on one side only are kept (structural union)
//! - A registered [`FieldMerge`] decides any differing field it wants to
//! - Remaining differences go to the side with the newer timestamp;
//!   equal or missing timestamps favour the remote side
//!
//! Merging is deterministic: the same conflict and merger always produce
//! the same record.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::conflict::{ConflictRecord, DifferenceKind};

/// Collaborator-supplied merge function for one entity type.
pub trait FieldMerge: Send + Sync {
    /// Returns the value to keep for `field`, or `None` to fall back to the
    /// timestamp tie-break. An absent side is `None`.
    fn merge_field(&self, field: &str, local: Option<&Value>, remote: Option<&Value>) -> Option<Value>;
}

impl<F> FieldMerge for F
where
    F: Fn(&str, Option<&Value>, Option<&Value>) -> Option<Value> + Send + Sync,
{
    fn merge_field(&self, field: &str, local: Option<&Value>, remote: Option<&Value>) -> Option<Value> {
        self(field, local, remote)
    }
}

/// Explicit per-field preferences: listed fields always take one side.
#[derive(Debug, Clone, Default)]
pub struct FieldPreferences {
    local: HashSet<String>,
    remote: HashSet<String>,
}

impl FieldPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always keep the local value of `field`.
    pub fn prefer_local(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.remote.remove(&field);
        self.local.insert(field);
        self
    }

    /// Always keep the remote value of `field`.
    pub fn prefer_remote(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.local.remove(&field);
        self.remote.insert(field);
        self
    }
}

impl FieldMerge for FieldPreferences {
    fn merge_field(&self, field: &str, local: Option<&Value>, remote: Option<&Value>) -> Option<Value> {
        if self.local.contains(field) {
            Some(local.cloned().unwrap_or(Value::Null))
        } else if self.remote.contains(field) {
            Some(remote.cloned().unwrap_or(Value::Null))
        } else {
            None
        }
    }
}

/// Which side wins a tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

/// Local only when both sides carry a timestamp and local's is strictly
/// newer. Equal or missing timestamps go to remote.
pub fn newer_side(conflict: &ConflictRecord) -> Side {
    match (conflict.local_timestamp, conflict.remote_timestamp) {
        (Some(local), Some(remote)) if local > remote => Side::Local,
        _ => Side::Remote,
    }
}

/// Builds the merged record for a conflict.
pub fn merge_records(conflict: &ConflictRecord, merger: Option<&dyn FieldMerge>) -> Value {
    let mut merged: Map<String, Value> = conflict.remote_data.as_object().cloned().unwrap_or_default();
    if let Some(local) = conflict.local_data.as_object() {
        for (field, value) in local {
            if !merged.contains_key(field) {
                merged.insert(field.clone(), value.clone());
            }
        }
    }

    let tie_break = newer_side(conflict);
    for diff in &conflict.differences {
        let local = diff.local_value.as_ref();
        let remote = diff.remote_value.as_ref();

        if let Some(value) = merger.and_then(|m| m.merge_field(&diff.field, local, remote)) {
            merged.insert(diff.field.clone(), value);
            continue;
        }

        match diff.kind {
            // Union already holds the only value.
            DifferenceKind::MissingLocal | DifferenceKind::MissingRemote => {}
            DifferenceKind::ValueMismatch | DifferenceKind::TypeMismatch => {
                let winner = match tie_break {
                    Side::Local => local,
                    Side::Remote => remote,
                };
                if let Some(value) = winner {
                    merged.insert(diff.field.clone(), value.clone());
                }
            }
        }
    }

    Value::Object(merged)
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
