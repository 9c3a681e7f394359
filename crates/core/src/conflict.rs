// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict records and the durable active-conflict set.
//!
//! A [`ConflictRecord`] is a frozen snapshot of a divergence between the
//! local and remote copies of one entity. Records are never edited: a newer
//! detection for the same entity replaces the active record, and resolution
//! moves it into the history collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::clock::ClockSource;
use crate::error::{Error, Result};
use crate::store::DurableStore;

/// Collection holding unresolved conflicts.
pub const ACTIVE_COLLECTION: &str = "sync_conflicts";
/// Collection holding resolved conflicts.
pub const HISTORY_COLLECTION: &str = "sync_conflict_history";

/// How the two sides diverge as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Both sides edited the same record.
    UpdateConflict,
    /// One side deleted the record the other still has.
    DeleteConflict,
    /// The same id was created independently on both sides.
    CreateConflict,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::UpdateConflict => "update_conflict",
            ConflictType::DeleteConflict => "delete_conflict",
            ConflictType::CreateConflict => "create_conflict",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a single field diverges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Same JSON type, different value.
    ValueMismatch,
    /// Different JSON types (e.g. string vs number, null vs value).
    TypeMismatch,
    /// Field present remotely only.
    MissingLocal,
    /// Field present locally only.
    MissingRemote,
}

impl DifferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifferenceKind::ValueMismatch => "value_mismatch",
            DifferenceKind::TypeMismatch => "type_mismatch",
            DifferenceKind::MissingLocal => "missing_local",
            DifferenceKind::MissingRemote => "missing_remote",
        }
    }
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One diverging field. An absent side is `None`, distinct from JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    pub field: String,
    pub local_value: Option<Value>,
    pub remote_value: Option<Value>,
    pub kind: DifferenceKind,
}

/// Snapshot of a divergence between local and remote copies of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub id: String,
    pub entity: String,
    pub entity_id: String,
    pub local_data: Value,
    pub remote_data: Value,
    /// Last-modified marker of the local copy (ms), if it carried one.
    pub local_timestamp: Option<u64>,
    /// Last-modified marker of the remote copy (ms), if it carried one.
    pub remote_timestamp: Option<u64>,
    pub conflict_type: ConflictType,
    /// Diverging fields in field-name order. Never empty.
    pub differences: Vec<Difference>,
    pub detected_at: u64,
}

impl ConflictRecord {
    /// The difference entry for `field`, if it diverged.
    pub fn difference(&self, field: &str) -> Option<&Difference> {
        self.differences.iter().find(|d| d.field == field)
    }

    /// Names of the diverging fields.
    pub fn fields(&self) -> Vec<&str> {
        self.differences.iter().map(|d| d.field.as_str()).collect()
    }
}

/// Strategy family used to resolve a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    LocalWins,
    RemoteWins,
    Merge,
    Manual,
}

impl ResolutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionKind::LocalWins => "local_wins",
            ResolutionKind::RemoteWins => "remote_wins",
            ResolutionKind::Merge => "merge",
            ResolutionKind::Manual => "manual",
        }
    }
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "local_wins" | "local" => Ok(ResolutionKind::LocalWins),
            "remote_wins" | "remote" => Ok(ResolutionKind::RemoteWins),
            "merge" => Ok(ResolutionKind::Merge),
            "manual" => Ok(ResolutionKind::Manual),
            _ => Err(Error::InvalidStrategy(s.to_string())),
        }
    }
}

/// A retired conflict together with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConflict {
    pub conflict: ConflictRecord,
    pub strategy: ResolutionKind,
    /// Canonical record written locally and queued for propagation.
    pub record: Value,
    /// Id of the queued UPDATE operation.
    pub operation_id: String,
    pub resolved_at: u64,
}

/// Durable set of unresolved conflicts, at most one per `(entity, entity_id)`.
pub struct ConflictSet {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn ClockSource>,
    write_lock: Mutex<()>,
}

impl ConflictSet {
    pub fn open(store: Arc<dyn DurableStore>, clock: Arc<dyn ClockSource>) -> Result<Self> {
        store.init()?;
        Ok(ConflictSet { store, clock, write_lock: Mutex::new(()) })
    }

    /// Adds a conflict, replacing the active one for the same entity.
    ///
    /// Returns the replaced record, if any.
    pub fn record(&self, conflict: &ConflictRecord) -> Result<Option<ConflictRecord>> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let replaced = self.find(&conflict.entity, &conflict.entity_id)?;
        if let Some(old) = &replaced {
            if old.id != conflict.id {
                self.store.delete(ACTIVE_COLLECTION, &old.id)?;
            }
        }
        self.store.put(ACTIVE_COLLECTION, &conflict.id, &serde_json::to_value(conflict)?)?;
        tracing::debug!(
            id = %conflict.id,
            entity = %conflict.entity,
            entity_id = %conflict.entity_id,
            conflict_type = %conflict.conflict_type,
            "recorded conflict"
        );
        Ok(replaced)
    }

    pub fn get(&self, id: &str) -> Result<Option<ConflictRecord>> {
        match self.store.get(ACTIVE_COLLECTION, id)? {
            Some(value) => Ok(Some(decode(id, value)?)),
            None => Ok(None),
        }
    }

    /// Fetches an active conflict or fails with [`Error::ConflictNotFound`].
    pub fn require(&self, id: &str) -> Result<ConflictRecord> {
        self.get(id)?.ok_or_else(|| Error::ConflictNotFound(id.to_string()))
    }

    /// Active conflicts, oldest first.
    pub fn list(&self) -> Result<Vec<ConflictRecord>> {
        let mut conflicts = self
            .store
            .get_all(ACTIVE_COLLECTION)?
            .into_iter()
            .map(|(id, value)| decode(&id, value))
            .collect::<Result<Vec<_>>>()?;
        conflicts.sort_by(|a, b| a.detected_at.cmp(&b.detected_at).then_with(|| a.id.cmp(&b.id)));
        Ok(conflicts)
    }

    /// Active conflicts for one entity type.
    pub fn list_for_entity(&self, entity: &str) -> Result<Vec<ConflictRecord>> {
        Ok(self.list()?.into_iter().filter(|c| c.entity == entity).collect())
    }

    /// The active conflict for `(entity, entity_id)`, if any.
    pub fn find(&self, entity: &str, entity_id: &str) -> Result<Option<ConflictRecord>> {
        Ok(self.list()?.into_iter().find(|c| c.entity == entity && c.entity_id == entity_id))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.store.get_all(ACTIVE_COLLECTION)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Moves a conflict into the history with its outcome.
    ///
    /// History is written first, so a failed removal leaves the conflict active.
    pub fn retire(&self, resolved: &ResolvedConflict) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let id = &resolved.conflict.id;
        self.store.put(HISTORY_COLLECTION, id, &serde_json::to_value(resolved)?)?;
        self.store.delete(ACTIVE_COLLECTION, id)?;
        tracing::info!(id = %id, strategy = %resolved.strategy, "retired conflict");
        Ok(())
    }

    /// Resolved conflicts, most recent first.
    pub fn history(&self) -> Result<Vec<ResolvedConflict>> {
        let mut history = self
            .store
            .get_all(HISTORY_COLLECTION)?
            .into_iter()
            .map(|(id, value)| {
                serde_json::from_value(value)
                    .map_err(|e| Error::CorruptedData(format!("conflict history {}: {}", id, e)))
            })
            .collect::<Result<Vec<ResolvedConflict>>>()?;
        history.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));
        Ok(history)
    }

    /// Current time from the set's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

fn decode(id: &str, value: Value) -> Result<ConflictRecord> {
    serde_json::from_value(value).map_err(|e| Error::CorruptedData(format!("conflict {}: {}", id, e)))
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
