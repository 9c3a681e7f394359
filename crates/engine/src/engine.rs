// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `SyncEngine`: the composition root callers talk to.

use std::sync::Arc;
use std::time::Duration;

use fitsync_core::{
    ClockSource, ConflictDetector, ConflictRecord, ConflictResolver, ConflictSet, DurableStore,
    FieldMerge, ListenerId, OpStatus, OpType, OperationQueue, Priority, QueueEvent, QueueStats,
    ResolvedConflict, Resolution, RetryPolicy, SyncConfig, SyncOperation,
};
use serde_json::Value;

use crate::clock::TokioClock;
use crate::consistency::{CheckSummary, ConsistencyChecker, ConsistencyReport, RepairSummary};
use crate::error::{EngineError, Result};
use crate::executor::{RemoteExecutor, RemoteSource};
use crate::processor::{DrainReport, ProcessorStatus, QueueProcessor, ShutdownOutcome};

/// Builder for [`SyncEngine`].
pub struct SyncEngineBuilder {
    store: Arc<dyn DurableStore>,
    executor: Arc<dyn RemoteExecutor>,
    remote: Option<Arc<dyn RemoteSource>>,
    clock: Option<Arc<dyn ClockSource>>,
    config: SyncConfig,
}

impl SyncEngineBuilder {
    /// Read API used by consistency checks. Without one,
    /// [`SyncEngine::check_consistency`] fails with [`EngineError::NoRemoteSource`].
    pub fn remote_source(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Overrides the clock. Defaults to [`TokioClock`].
    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<SyncEngine> {
        let SyncEngineBuilder { store, executor, remote, clock, config } = self;
        config.validate()?;
        let clock = clock.unwrap_or_else(|| Arc::new(TokioClock::new()) as Arc<dyn ClockSource>);

        let queue = Arc::new(OperationQueue::open(Arc::clone(&store), Arc::clone(&clock), config.queue.clone())?);
        let conflicts = Arc::new(ConflictSet::open(Arc::clone(&store), Arc::clone(&clock))?);
        let resolver = ConflictResolver::new(
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::clone(&conflicts),
            config.conflicts.clone(),
        );
        let processor = QueueProcessor::new(
            Arc::clone(&queue),
            executor,
            RetryPolicy::new(config.retry.clone()),
            config.processor.clone(),
        );
        let checker = remote.map(|remote| {
            ConsistencyChecker::new(
                Arc::clone(&store),
                remote,
                ConflictDetector::new(config.conflicts.clone(), Arc::clone(&clock)),
                Arc::clone(&conflicts),
                Arc::clone(&queue),
            )
        });

        Ok(SyncEngine { config, queue, conflicts, resolver, processor, checker })
    }
}

/// Offline sync engine: durable queue, drain loop, conflict handling.
pub struct SyncEngine {
    config: SyncConfig,
    queue: Arc<OperationQueue>,
    conflicts: Arc<ConflictSet>,
    resolver: ConflictResolver,
    processor: QueueProcessor,
    checker: Option<ConsistencyChecker>,
}

impl SyncEngine {
    pub fn builder(store: Arc<dyn DurableStore>, executor: Arc<dyn RemoteExecutor>) -> SyncEngineBuilder {
        SyncEngineBuilder { store, executor, remote: None, clock: None, config: SyncConfig::default() }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<OperationQueue> {
        &self.queue
    }

    // Queue

    /// Persists an operation. The drain loop, if running, is woken.
    pub fn add_operation(
        &self,
        op_type: OpType,
        entity: &str,
        payload: Value,
        priority: Option<Priority>,
        max_retries: Option<u32>,
    ) -> Result<String> {
        Ok(self.queue.add_operation(op_type, entity, payload, priority, max_retries)?)
    }

    pub fn get_pending_operations(&self) -> Result<Vec<SyncOperation>> {
        Ok(self.queue.get_pending_operations()?)
    }

    pub fn get_operations_by_status(&self, status: OpStatus) -> Result<Vec<SyncOperation>> {
        Ok(self.queue.get_operations_by_status(status)?)
    }

    pub fn get_queue_stats(&self) -> Result<QueueStats> {
        Ok(self.queue.stats()?)
    }

    /// Removes completed operations older than `older_than_hours`, or the
    /// configured retention when `None`.
    pub fn cleanup_completed_operations(&self, older_than_hours: Option<u64>) -> Result<usize> {
        let hours = older_than_hours.unwrap_or(self.config.queue.retention_hours);
        Ok(self.queue.cleanup_completed(hours)?)
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        self.queue.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.queue.remove_listener(id)
    }

    // Processing

    pub fn start_processing(&self) -> Result<()> {
        self.processor.start()
    }

    /// Non-blocking stop; in-flight calls finish on their own.
    pub fn stop_processing(&self) {
        self.processor.stop();
    }

    pub async fn shutdown(&self, timeout: Duration) -> ShutdownOutcome {
        self.processor.shutdown(timeout).await
    }

    pub async fn drain_once(&self) -> Result<DrainReport> {
        self.processor.drain_once().await
    }

    pub fn processor_status(&self) -> ProcessorStatus {
        self.processor.status()
    }

    // Conflicts

    fn checker(&self) -> Result<&ConsistencyChecker> {
        self.checker.as_ref().ok_or(EngineError::NoRemoteSource)
    }

    pub async fn check_consistency(&self, table: &str, identity: &str) -> Result<ConsistencyReport> {
        self.checker()?.check_consistency(table, identity).await
    }

    pub async fn check_tables(&self, tables: &[&str], identity: &str) -> Result<CheckSummary> {
        self.checker()?.check_tables(tables, identity).await
    }

    pub fn repair_missing(&self, report: &ConsistencyReport) -> Result<RepairSummary> {
        self.checker()?.repair_missing(report)
    }

    /// Active conflicts, oldest first.
    pub fn conflicts(&self) -> Result<Vec<ConflictRecord>> {
        Ok(self.conflicts.list()?)
    }

    pub fn conflict(&self, id: &str) -> Result<Option<ConflictRecord>> {
        Ok(self.conflicts.get(id)?)
    }

    pub fn conflict_history(&self) -> Result<Vec<ResolvedConflict>> {
        Ok(self.conflicts.history()?)
    }

    pub fn register_merge(&self, entity: impl Into<String>, merger: Arc<dyn FieldMerge>) {
        self.resolver.register_merge(entity, merger);
    }

    pub fn resolve_conflict(&self, conflict_id: &str, resolution: Resolution) -> Result<ResolvedConflict> {
        Ok(self.resolver.resolve(conflict_id, resolution)?)
    }

    /// Resolves with a caller-supplied canonical record.
    pub fn resolve_conflict_manually(&self, conflict_id: &str, record: Value) -> Result<ResolvedConflict> {
        Ok(self.resolver.resolve_manually(conflict_id, record)?)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
