// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field-by-field divergence detection between local and remote records.

use chrono::DateTime;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::clock::ClockSource;
use crate::config::ConflictConfig;
use crate::conflict::{ConflictRecord, ConflictType, Difference, DifferenceKind};
use crate::error::{Error, Result};
use crate::id::{generate_id, CONFLICT_PREFIX};
use crate::operation::record_id;

/// Compares local and remote copies of an entity.
pub struct ConflictDetector {
    config: ConflictConfig,
    ignored: HashSet<String>,
    clock: Arc<dyn ClockSource>,
}

impl ConflictDetector {
    pub fn new(config: ConflictConfig, clock: Arc<dyn ClockSource>) -> Self {
        let ignored = config.ignored_fields.iter().cloned().collect();
        ConflictDetector { config, ignored, clock }
    }

    pub fn config(&self) -> &ConflictConfig {
        &self.config
    }

    /// Returns a conflict when the records diverge in at least one compared
    /// field, `None` when they agree.
    ///
    /// Both records must be JSON objects.
    pub fn detect(&self, entity: &str, local: &Value, remote: &Value) -> Result<Option<ConflictRecord>> {
        let (Some(local_map), Some(remote_map)) = (local.as_object(), remote.as_object()) else {
            return Err(Error::InvalidInput(format!("{} records must be JSON objects", entity)));
        };

        let differences = self.differences(local_map, remote_map);
        if differences.is_empty() {
            return Ok(None);
        }

        let entity_id = record_id(local, &self.config.id_field)
            .or_else(|| record_id(remote, &self.config.id_field))
            .unwrap_or_default();
        let now = self.clock.now_ms();

        Ok(Some(ConflictRecord {
            id: generate_id(CONFLICT_PREFIX, &format!("{}/{}", entity, entity_id), now),
            entity: entity.to_string(),
            entity_id,
            local_timestamp: self.timestamp(local_map),
            remote_timestamp: self.timestamp(remote_map),
            conflict_type: self.classify(local_map, remote_map),
            differences,
            local_data: local.clone(),
            remote_data: remote.clone(),
            detected_at: now,
        }))
    }

    /// Per-field differences over the union of field names, in name order.
    pub fn differences(&self, local: &Map<String, Value>, remote: &Map<String, Value>) -> Vec<Difference> {
        let fields: BTreeSet<&String> = local.keys().chain(remote.keys()).collect();

        fields
            .into_iter()
            .filter(|field| !self.ignored.contains(field.as_str()))
            .filter_map(|field| {
                let l = local.get(field);
                let r = remote.get(field);
                let kind = match (l, r) {
                    (Some(l), Some(r)) if values_equal(l, r) => return None,
                    (Some(l), Some(r)) if json_type(l) != json_type(r) => DifferenceKind::TypeMismatch,
                    (Some(_), Some(_)) => DifferenceKind::ValueMismatch,
                    (None, Some(_)) => DifferenceKind::MissingLocal,
                    (Some(_), None) => DifferenceKind::MissingRemote,
                    (None, None) => return None,
                };
                Some(Difference {
                    field: field.clone(),
                    local_value: l.cloned(),
                    remote_value: r.cloned(),
                    kind,
                })
            })
            .collect()
    }

    fn classify(&self, local: &Map<String, Value>, remote: &Map<String, Value>) -> ConflictType {
        let deleted = |m: &Map<String, Value>| m.get(&self.config.deleted_field).is_some_and(|v| !v.is_null());
        if deleted(local) != deleted(remote) {
            return ConflictType::DeleteConflict;
        }

        let created_local = local.get(&self.config.created_field).filter(|v| !v.is_null());
        let created_remote = remote.get(&self.config.created_field).filter(|v| !v.is_null());
        match (created_local, created_remote) {
            (Some(l), Some(r)) if !values_equal(l, r) => ConflictType::CreateConflict,
            _ => ConflictType::UpdateConflict,
        }
    }

    fn timestamp(&self, record: &Map<String, Value>) -> Option<u64> {
        record.get(&self.config.timestamp_field).and_then(parse_timestamp)
    }
}

/// Reads a timestamp as epoch ms from an integer, a numeric string, or an
/// RFC 3339 string.
pub fn parse_timestamp(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.parse::<u64>().ok().or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .and_then(|dt| u64::try_from(dt.timestamp_millis()).ok())
        }),
        _ => None,
    }
}

/// Equality that treats numerically equal numbers (`100` and `100.0`) as equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || ((x.is_f64() || y.is_f64()) && x.as_f64() == y.as_f64())
        }
        _ => a == b,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
