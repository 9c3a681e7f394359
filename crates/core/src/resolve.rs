// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict resolution.
//!
//! Resolving a conflict happens in three steps, each of which must succeed
//! before the next runs:
//!
//! 1. the canonical record is written to the store (collection = entity)
//! 2. an `UPDATE` carrying it is queued for remote propagation
//! 3. the conflict is retired into the history
//!
//! Any failure is returned to the caller and leaves the conflict active, so
//! the resolution can simply be attempted again.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::ConflictConfig;
use crate::conflict::{ConflictRecord, ConflictSet, ResolutionKind, ResolvedConflict};
use crate::error::{Error, Result};
use crate::merge::{merge_records, FieldMerge};
use crate::operation::{record_id, OpType};
use crate::queue::OperationQueue;
use crate::store::DurableStore;

/// How to reconcile a conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Keep the local snapshot.
    LocalWins,
    /// Keep the remote snapshot.
    RemoteWins,
    /// Field-by-field merge using the entity's registered merge function.
    Merge,
    /// Use a caller-supplied record for the same entity.
    Manual(Value),
}

impl Resolution {
    pub fn kind(&self) -> ResolutionKind {
        match self {
            Resolution::LocalWins => ResolutionKind::LocalWins,
            Resolution::RemoteWins => ResolutionKind::RemoteWins,
            Resolution::Merge => ResolutionKind::Merge,
            Resolution::Manual(_) => ResolutionKind::Manual,
        }
    }

    /// Builds a resolution from a strategy name and an optional record.
    ///
    /// `manual` requires the record; the other strategies refuse one.
    pub fn from_parts(kind: ResolutionKind, record: Option<Value>) -> Result<Self> {
        match (kind, record) {
            (ResolutionKind::Manual, Some(record)) => Ok(Resolution::Manual(record)),
            (ResolutionKind::Manual, None) => {
                Err(Error::InvalidInput("manual resolution requires a record".to_string()))
            }
            (kind, Some(_)) => {
                Err(Error::InvalidInput(format!("{} resolution does not take a record", kind)))
            }
            (ResolutionKind::LocalWins, None) => Ok(Resolution::LocalWins),
            (ResolutionKind::RemoteWins, None) => Ok(Resolution::RemoteWins),
            (ResolutionKind::Merge, None) => Ok(Resolution::Merge),
        }
    }
}

/// Applies resolution strategies and publishes the outcome.
pub struct ConflictResolver {
    store: Arc<dyn DurableStore>,
    queue: Arc<OperationQueue>,
    conflicts: Arc<ConflictSet>,
    config: ConflictConfig,
    mergers: RwLock<HashMap<String, Arc<dyn FieldMerge>>>,
}

impl ConflictResolver {
    pub fn new(
        store: Arc<dyn DurableStore>,
        queue: Arc<OperationQueue>,
        conflicts: Arc<ConflictSet>,
        config: ConflictConfig,
    ) -> Self {
        ConflictResolver { store, queue, conflicts, config, mergers: RwLock::new(HashMap::new()) }
    }

    /// Registers the merge function used for `entity` by [`Resolution::Merge`].
    pub fn register_merge(&self, entity: impl Into<String>, merger: Arc<dyn FieldMerge>) {
        self.mergers.write().unwrap_or_else(|e| e.into_inner()).insert(entity.into(), merger);
    }

    fn merger_for(&self, entity: &str) -> Option<Arc<dyn FieldMerge>> {
        self.mergers.read().unwrap_or_else(|e| e.into_inner()).get(entity).cloned()
    }

    /// Computes the canonical record without side effects.
    pub fn preview(&self, conflict: &ConflictRecord, resolution: &Resolution) -> Result<Value> {
        match resolution {
            Resolution::LocalWins => Ok(conflict.local_data.clone()),
            Resolution::RemoteWins => Ok(conflict.remote_data.clone()),
            Resolution::Merge => {
                let merger = self.merger_for(&conflict.entity);
                Ok(merge_records(conflict, merger.as_deref()))
            }
            Resolution::Manual(record) => {
                self.validate_manual(conflict, record)?;
                Ok(record.clone())
            }
        }
    }

    fn validate_manual(&self, conflict: &ConflictRecord, record: &Value) -> Result<()> {
        if !record.is_object() {
            return Err(Error::InvalidInput("manual resolution must be a JSON object".to_string()));
        }
        let actual = record_id(record, &self.config.id_field);
        if actual.as_deref() != Some(conflict.entity_id.as_str()) {
            return Err(Error::EntityMismatch {
                expected: format!("{}/{}", conflict.entity, conflict.entity_id),
                actual: format!(
                    "{}/{}",
                    conflict.entity,
                    actual.unwrap_or_else(|| format!("<missing {}>", self.config.id_field))
                ),
            });
        }
        Ok(())
    }

    /// Resolves the active conflict `conflict_id`.
    pub fn resolve(&self, conflict_id: &str, resolution: Resolution) -> Result<ResolvedConflict> {
        let conflict = self.conflicts.require(conflict_id)?;
        self.resolve_record(&conflict, resolution)
    }

    /// Resolves with a caller-supplied record.
    pub fn resolve_manually(&self, conflict_id: &str, record: Value) -> Result<ResolvedConflict> {
        self.resolve(conflict_id, Resolution::Manual(record))
    }

    /// Resolves a conflict snapshot. Repeating this for the same snapshot and
    /// strategy writes the same canonical record again.
    pub fn resolve_record(&self, conflict: &ConflictRecord, resolution: Resolution) -> Result<ResolvedConflict> {
        let record = self.preview(conflict, &resolution)?;

        self.store.put(&conflict.entity, &conflict.entity_id, &record)?;
        let operation_id = self.queue.add_operation(
            OpType::Update,
            &conflict.entity,
            record.clone(),
            Some(self.config.propagation_priority),
            None,
        )?;

        let resolved = ResolvedConflict {
            conflict: conflict.clone(),
            strategy: resolution.kind(),
            record,
            operation_id,
            resolved_at: self.conflicts.now_ms(),
        };
        self.conflicts.retire(&resolved)?;

        tracing::info!(
            conflict = %conflict.id,
            entity = %conflict.entity,
            entity_id = %conflict.entity_id,
            strategy = %resolved.strategy,
            operation = %resolved.operation_id,
            "resolved conflict"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
