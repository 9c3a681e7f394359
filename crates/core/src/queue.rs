// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable operation queue.
//!
//! Every mutating call writes through to the [`DurableStore`] before it
//! returns; nothing is cached in memory. Reads always reload the collection,
//! so a queue reopened over the same store sees exactly what was persisted.
//!
//! Status changes are restricted to the transitions allowed by
//! [`OpStatus::can_transition_to`]. Only the queue processor is expected to
//! call the transition methods; callers enqueue, inspect and clean up.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use crate::clock::ClockSource;
use crate::config::QueueConfig;
use crate::error::{Error, Result};
use crate::events::{ListenerId, Listeners, QueueEvent};
use crate::id::{generate_unique_id, OPERATION_PREFIX};
use crate::operation::{dispatch_order, enqueue_order, OpStatus, OpType, Priority, QueueStats, SyncOperation};
use crate::store::DurableStore;

const MS_PER_HOUR: u64 = 3_600_000;

/// Outcome of [`OperationQueue::recover_interrupted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Operations moved from `processing` back to `pending`.
    pub requeued: Vec<String>,
    /// Records that could not be decoded and were moved aside. Rows that
    /// were not even JSON are kept as their raw text.
    pub quarantined: Vec<String>,
}

impl RecoveryReport {
    pub fn is_empty(&self) -> bool {
        self.requeued.is_empty() && self.quarantined.is_empty()
    }
}

/// Durable, priority-ordered collection of pending mutations.
pub struct OperationQueue {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn ClockSource>,
    config: QueueConfig,
    listeners: Listeners,
    /// Serializes read-modify-write sequences against the store.
    write_lock: Mutex<()>,
}

impl OperationQueue {
    /// Opens a queue over `store`, initializing the store if needed.
    pub fn open(
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn ClockSource>,
        config: QueueConfig,
    ) -> Result<Self> {
        store.init()?;
        Ok(OperationQueue { store, clock, config, listeners: Listeners::new(), write_lock: Mutex::new(()) })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn ClockSource> {
        &self.clock
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    fn collection(&self) -> &str {
        &self.config.collection
    }

    fn quarantine_collection(&self) -> String {
        format!("{}_corrupt", self.config.collection)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persists a new `pending` operation and returns its id.
    ///
    /// `priority` and `max_retries` fall back to the configured defaults.
    pub fn add_operation(
        &self,
        op_type: OpType,
        entity: &str,
        payload: Value,
        priority: Option<Priority>,
        max_retries: Option<u32>,
    ) -> Result<String> {
        let entity = entity.trim();
        if entity.is_empty() {
            return Err(Error::InvalidInput("entity must not be empty".to_string()));
        }

        let op = {
            let _guard = self.lock();
            let now = self.clock.now_ms();
            let (id, seq) = self.allocate(entity, now)?;
            let mut op = SyncOperation::new(
                id,
                op_type,
                entity.to_string(),
                payload,
                priority.unwrap_or(self.config.default_priority),
                max_retries.unwrap_or(self.config.default_max_retries),
                now,
            );
            op.seq = seq;
            self.write(&op)?;
            op
        };

        tracing::debug!(id = %op.id, op_type = %op.op_type, entity = %op.entity, "enqueued operation");
        let id = op.id.clone();
        self.listeners.emit(&QueueEvent::Enqueued(op));
        Ok(id)
    }

    /// Picks an unused id and the next `seq`. Caller holds the write lock.
    fn allocate(&self, entity: &str, now: u64) -> Result<(String, u64)> {
        let mut existing = HashSet::new();
        let mut last_seq = 0;
        for (id, row) in self.store.scan(self.collection())? {
            let seq = row.as_ref().ok().and_then(|value| value.get("seq")).and_then(Value::as_u64);
            last_seq = last_seq.max(seq.unwrap_or(0));
            existing.insert(id);
        }
        let id = generate_unique_id(OPERATION_PREFIX, entity, now, |id| existing.contains(id));
        Ok((id, last_seq + 1))
    }

    fn write(&self, op: &SyncOperation) -> Result<()> {
        let value = serde_json::to_value(op)?;
        self.store.put(self.collection(), &op.id, &value)?;
        Ok(())
    }

    /// Fetches one operation.
    pub fn get(&self, id: &str) -> Result<Option<SyncOperation>> {
        match self.store.get(self.collection(), id)? {
            Some(value) => Ok(Some(decode(id, value)?)),
            None => Ok(None),
        }
    }

    fn require(&self, id: &str) -> Result<SyncOperation> {
        self.get(id)?.ok_or_else(|| Error::OperationNotFound(id.to_string()))
    }

    /// Loads every decodable operation; undecodable records are logged and skipped.
    fn load(&self) -> Result<Vec<SyncOperation>> {
        let mut ops = Vec::new();
        for (id, row) in self.store.scan(self.collection())? {
            let decoded = match row {
                Ok(value) => decode(&id, value),
                Err(bad) => Err(corrupted(&id, &bad.reason)),
            };
            match decoded {
                Ok(op) => ops.push(op),
                Err(e) => tracing::warn!(id = %id, error = %e, "skipping corrupt queue record"),
            }
        }
        Ok(ops)
    }

    /// Every operation in dispatch order.
    pub fn all_operations(&self) -> Result<Vec<SyncOperation>> {
        let mut ops = self.load()?;
        ops.sort_by(dispatch_order);
        Ok(ops)
    }

    /// Outstanding operations: `pending`, plus `failed` ones with budget left,
    /// ordered by priority (desc) then enqueue time (asc).
    pub fn get_pending_operations(&self) -> Result<Vec<SyncOperation>> {
        let mut ops: Vec<_> = self.load()?.into_iter().filter(SyncOperation::is_outstanding).collect();
        ops.sort_by(dispatch_order);
        Ok(ops)
    }

    /// Operations with the given status, in dispatch order.
    pub fn get_operations_by_status(&self, status: OpStatus) -> Result<Vec<SyncOperation>> {
        let mut ops: Vec<_> = self.load()?.into_iter().filter(|op| op.status == status).collect();
        ops.sort_by(dispatch_order);
        Ok(ops)
    }

    /// Operations the drain loop may dispatch right now, at most `limit`.
    ///
    /// With `serialize_per_entity`, an operation that carries an entity id is
    /// only eligible when it is the oldest pending operation for its
    /// `(entity, entity_id)` key and no operation of that key is processing.
    pub fn ready_operations(&self, limit: usize, serialize_per_entity: bool) -> Result<Vec<SyncOperation>> {
        let now = self.clock.now_ms();
        let ops = self.load()?;

        let mut ready: Vec<SyncOperation> = if serialize_per_entity {
            let busy: HashSet<(String, String)> = ops
                .iter()
                .filter(|op| op.status == OpStatus::Processing)
                .filter_map(owned_key)
                .collect();

            let mut heads: HashMap<(String, String), &SyncOperation> = HashMap::new();
            for op in ops.iter().filter(|op| op.status == OpStatus::Pending) {
                if let Some(key) = owned_key(op) {
                    heads
                        .entry(key)
                        .and_modify(|head| {
                            if enqueue_order(op, head).is_lt() {
                                *head = op;
                            }
                        })
                        .or_insert(op);
                }
            }
            let head_ids: HashSet<&str> = heads
                .iter()
                .filter(|(key, _)| !busy.contains(*key))
                .map(|(_, op)| op.id.as_str())
                .collect();

            ops.iter()
                .filter(|op| op.is_ready(now))
                .filter(|op| op.entity_id.is_none() || head_ids.contains(op.id.as_str()))
                .cloned()
                .collect()
        } else {
            ops.into_iter().filter(|op| op.is_ready(now)).collect()
        };

        ready.sort_by(dispatch_order);
        ready.truncate(limit);
        Ok(ready)
    }

    /// Earliest `next_retry_at` among pending operations still waiting on backoff.
    pub fn next_retry_at(&self) -> Result<Option<u64>> {
        let now = self.clock.now_ms();
        Ok(self
            .load()?
            .iter()
            .filter(|op| op.status == OpStatus::Pending)
            .filter_map(|op| op.next_retry_at)
            .filter(|at| *at > now)
            .min())
    }

    /// Aggregate counts by status.
    pub fn stats(&self) -> Result<QueueStats> {
        Ok(QueueStats::from_operations(&self.load()?))
    }

    /// Applies a validated status transition, recording `error` when given.
    ///
    /// Fails with [`Error::OperationNotFound`] if the operation is gone and
    /// [`Error::InvalidTransition`] if the move is not allowed.
    pub fn update_status(&self, id: &str, status: OpStatus, error: Option<&str>) -> Result<SyncOperation> {
        self.transition(id, status, |op| {
            if let Some(error) = error {
                op.last_error = Some(error.to_string());
            }
        })
    }

    /// `pending -> processing`, persisted before any network dispatch.
    pub fn mark_processing(&self, id: &str) -> Result<SyncOperation> {
        self.transition(id, OpStatus::Processing, |op| op.next_retry_at = None)
    }

    /// `processing -> completed`.
    pub fn mark_completed(&self, id: &str) -> Result<SyncOperation> {
        self.transition(id, OpStatus::Completed, |op| op.next_retry_at = None)
    }

    /// `processing -> pending` with an incremented retry count.
    ///
    /// Refuses to exceed the retry budget or to schedule into the past.
    pub fn schedule_retry(&self, id: &str, error: &str, next_retry_at: u64) -> Result<SyncOperation> {
        let now = self.clock.now_ms();
        if next_retry_at <= now {
            return Err(Error::InvalidInput(format!(
                "retry for {} must be scheduled in the future ({} <= {})",
                id, next_retry_at, now
            )));
        }

        let _guard = self.lock();
        let current = self.require(id)?;
        if !current.has_retries_left() {
            return Err(invalid_transition(&current, OpStatus::Pending));
        }
        self.apply_locked(current, OpStatus::Pending, |op| {
            op.retry_count += 1;
            op.last_error = Some(error.to_string());
            op.next_retry_at = Some(next_retry_at);
        })
    }

    /// `processing -> failed`. Terminal.
    pub fn mark_failed(&self, id: &str, error: &str) -> Result<SyncOperation> {
        self.transition(id, OpStatus::Failed, |op| {
            op.last_error = Some(error.to_string());
            op.next_retry_at = None;
        })
    }

    fn transition(
        &self,
        id: &str,
        to: OpStatus,
        mutate: impl FnOnce(&mut SyncOperation),
    ) -> Result<SyncOperation> {
        let _guard = self.lock();
        let current = self.require(id)?;
        self.apply_locked(current, to, mutate)
    }

    fn apply_locked(
        &self,
        current: SyncOperation,
        to: OpStatus,
        mutate: impl FnOnce(&mut SyncOperation),
    ) -> Result<SyncOperation> {
        let from = current.status;
        if !from.can_transition_to(to) {
            return Err(invalid_transition(&current, to));
        }

        let mut op = current;
        op.status = to;
        op.updated_at = self.clock.now_ms();
        mutate(&mut op);
        self.write(&op)?;

        tracing::debug!(id = %op.id, %from, %to, retry_count = op.retry_count, "operation transition");
        self.listeners.emit(&QueueEvent::StatusChanged { operation: op.clone(), from, to });
        Ok(op)
    }

    /// Deletes `completed` operations finished more than `older_than_hours` ago.
    pub fn cleanup_completed(&self, older_than_hours: u64) -> Result<usize> {
        let now = self.clock.now_ms();
        let cutoff = now.saturating_sub(older_than_hours.saturating_mul(MS_PER_HOUR));

        let removed: Vec<String> = {
            let _guard = self.lock();
            let mut removed = Vec::new();
            for op in self.load()? {
                if op.status == OpStatus::Completed && op.updated_at < cutoff {
                    self.store.delete(self.collection(), &op.id)?;
                    removed.push(op.id);
                }
            }
            removed
        };

        if !removed.is_empty() {
            tracing::info!(count = removed.len(), older_than_hours, "cleaned up completed operations");
        }
        for id in &removed {
            self.listeners.emit(&QueueEvent::Removed { id: id.clone() });
        }
        Ok(removed.len())
    }

    /// Deletes an operation regardless of status. Returns false if absent.
    pub fn remove_operation(&self, id: &str) -> Result<bool> {
        let removed = {
            let _guard = self.lock();
            self.store.delete(self.collection(), id)?
        };
        if removed {
            tracing::debug!(id, "removed operation");
            self.listeners.emit(&QueueEvent::Removed { id: id.to_string() });
        }
        Ok(removed)
    }

    /// Reconciles state left behind by an interrupted run.
    ///
    /// Operations still `processing` are moved back to `pending` with
    /// `next_retry_at = now` (completion cannot be assumed across a crash).
    /// Records that no longer decode as operations are moved to the
    /// `<collection>_corrupt` collection.
    pub fn recover_interrupted(&self) -> Result<RecoveryReport> {
        let mut report = RecoveryReport::default();
        let mut events = Vec::new();

        {
            let _guard = self.lock();
            let now = self.clock.now_ms();
            let quarantine = self.quarantine_collection();

            for (id, row) in self.store.scan(self.collection())? {
                let decoded = match row {
                    Ok(value) => decode(&id, value.clone()).map_err(|e| (value, e)),
                    Err(bad) => Err((Value::String(bad.raw), corrupted(&id, &bad.reason))),
                };
                let mut op = match decoded {
                    Ok(op) => op,
                    Err((value, e)) => {
                        tracing::warn!(id = %id, error = %e, "quarantining corrupt queue record");
                        self.store.put(&quarantine, &id, &value)?;
                        self.store.delete(self.collection(), &id)?;
                        report.quarantined.push(id);
                        continue;
                    }
                };
                if op.status != OpStatus::Processing {
                    continue;
                }
                op.status = OpStatus::Pending;
                op.next_retry_at = Some(now);
                op.updated_at = now;
                self.write(&op)?;
                report.requeued.push(op.id.clone());
                events.push(QueueEvent::StatusChanged {
                    operation: op,
                    from: OpStatus::Processing,
                    to: OpStatus::Pending,
                });
            }
        }

        if !report.is_empty() {
            tracing::info!(
                requeued = report.requeued.len(),
                quarantined = report.quarantined.len(),
                "recovered interrupted queue state"
            );
        }
        for event in &events {
            self.listeners.emit(event);
        }
        Ok(report)
    }

    /// Enqueues a fresh copy of a `failed` operation and returns the new id.
    ///
    /// The failed original is left untouched; terminal operations are never
    /// revived in place.
    pub fn requeue_failed(&self, id: &str) -> Result<String> {
        let failed = self.require(id)?;
        if failed.status != OpStatus::Failed {
            return Err(invalid_transition(&failed, OpStatus::Pending));
        }
        self.add_operation(
            failed.op_type,
            &failed.entity,
            failed.payload,
            Some(failed.priority),
            Some(failed.max_retries),
        )
    }

    /// Registers a listener fired on enqueue, every status change, and removal.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        self.listeners.add(listener)
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl std::fmt::Debug for OperationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationQueue")
            .field("collection", &self.config.collection)
            .field("listeners", &self.listeners)
            .finish()
    }
}

fn decode(id: &str, value: Value) -> Result<SyncOperation> {
    serde_json::from_value(value).map_err(|e| corrupted(id, &e.to_string()))
}

fn corrupted(id: &str, reason: &str) -> Error {
    Error::CorruptedData(format!("queue record {}: {}", id, reason))
}

fn owned_key(op: &SyncOperation) -> Option<(String, String)> {
    op.entity_key().map(|(entity, id)| (entity.to_string(), id.to_string()))
}

fn invalid_transition(op: &SyncOperation, to: OpStatus) -> Error {
    Error::InvalidTransition { id: op.id.clone(), from: op.status.to_string(), to: to.to_string() }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
