// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Consistency checker.
//!
//! Batch comparison of one table's local records against the remote copy for
//! a single identity. Records present on both sides go through the conflict
//! detector; detected conflicts are persisted to the [`ConflictSet`] for the
//! resolver to pick up.

use std::collections::BTreeMap;
use std::sync::Arc;

use fitsync_core::operation::record_id;
use fitsync_core::{ConflictDetector, ConflictRecord, ConflictSet, DurableStore, OpType, OperationQueue};
use serde::Serialize;
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::executor::RemoteSource;

/// Outcome of comparing one table for one identity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub table: String,
    pub identity: String,
    pub local_count: usize,
    pub remote_count: usize,
    /// Ids present on both sides with no meaningful difference.
    pub consistent_count: usize,
    /// Ids the remote has and the local store does not.
    pub missing_local: Vec<String>,
    /// Ids the local store has and the remote does not.
    pub missing_remote: Vec<String>,
    pub conflicts: Vec<ConflictRecord>,
    #[serde(skip)]
    remote_only: Vec<(String, Value)>,
    #[serde(skip)]
    local_only: Vec<(String, Value)>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_local.is_empty() && self.missing_remote.is_empty() && self.conflicts.is_empty()
    }
}

/// A table whose remote fetch failed during [`ConsistencyChecker::check_tables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFailure {
    pub table: String,
    pub error: String,
}

/// Reports for every table that could be checked, plus the ones that could not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckSummary {
    pub reports: Vec<ConsistencyReport>,
    pub failures: Vec<TableFailure>,
}

impl CheckSummary {
    pub fn is_consistent(&self) -> bool {
        self.failures.is_empty() && self.reports.iter().all(ConsistencyReport::is_consistent)
    }
}

/// What [`ConsistencyChecker::repair_missing`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Remote-only records written to the local store.
    pub pulled: usize,
    /// Local-only records enqueued as `CREATE` operations.
    pub pushed: usize,
}

pub struct ConsistencyChecker {
    store: Arc<dyn DurableStore>,
    remote: Arc<dyn RemoteSource>,
    detector: ConflictDetector,
    conflicts: Arc<ConflictSet>,
    queue: Arc<OperationQueue>,
}

impl ConsistencyChecker {
    pub fn new(
        store: Arc<dyn DurableStore>,
        remote: Arc<dyn RemoteSource>,
        detector: ConflictDetector,
        conflicts: Arc<ConflictSet>,
        queue: Arc<OperationQueue>,
    ) -> Self {
        ConsistencyChecker { store, remote, detector, conflicts, queue }
    }

    /// Compares `table` for `identity` and records any conflicts found.
    ///
    /// A failed remote fetch is returned as [`EngineError::Remote`]; nothing
    /// is written in that case.
    pub async fn check_consistency(&self, table: &str, identity: &str) -> Result<ConsistencyReport> {
        let fetched = self
            .remote
            .fetch_all(table, identity)
            .await
            .map_err(|source| EngineError::Remote { table: table.to_string(), source })?;

        let local = self.local_records(table, identity)?;
        let remote = self.keyed(table, fetched);

        let mut report = ConsistencyReport {
            table: table.to_string(),
            identity: identity.to_string(),
            local_count: local.len(),
            remote_count: remote.len(),
            ..Default::default()
        };

        for (id, local_record) in &local {
            let Some(remote_record) = remote.get(id) else {
                report.missing_remote.push(id.clone());
                report.local_only.push((id.clone(), local_record.clone()));
                continue;
            };
            match self.detector.detect(table, local_record, remote_record)? {
                Some(conflict) => {
                    self.conflicts.record(&conflict)?;
                    report.conflicts.push(conflict);
                }
                None => report.consistent_count += 1,
            }
        }

        for (id, remote_record) in remote {
            if !local.contains_key(&id) {
                report.missing_local.push(id.clone());
                report.remote_only.push((id, remote_record));
            }
        }

        tracing::info!(
            table,
            identity,
            consistent = report.consistent_count,
            missing_local = report.missing_local.len(),
            missing_remote = report.missing_remote.len(),
            conflicts = report.conflicts.len(),
            "consistency check finished"
        );
        Ok(report)
    }

    /// Checks several tables. A remote failure on one table is recorded and
    /// the rest still run; local storage failures abort the whole check.
    pub async fn check_tables(&self, tables: &[&str], identity: &str) -> Result<CheckSummary> {
        let mut summary = CheckSummary::default();
        for table in tables {
            match self.check_consistency(table, identity).await {
                Ok(report) => summary.reports.push(report),
                Err(EngineError::Remote { table, source }) => {
                    tracing::warn!(%table, error = %source, "skipping table, remote fetch failed");
                    summary.failures.push(TableFailure { table, error: source.to_string() });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// Fills the gaps a report found: remote-only records are written
    /// locally, local-only records are queued for creation remotely.
    pub fn repair_missing(&self, report: &ConsistencyReport) -> Result<RepairSummary> {
        let mut summary = RepairSummary::default();
        for (id, record) in &report.remote_only {
            self.store.put(&report.table, id, record)?;
            summary.pulled += 1;
        }
        for (_, record) in &report.local_only {
            self.queue.add_operation(OpType::Create, &report.table, record.clone(), None, None)?;
            summary.pushed += 1;
        }
        if summary != RepairSummary::default() {
            tracing::info!(table = %report.table, pulled = summary.pulled, pushed = summary.pushed, "repaired missing records");
        }
        Ok(summary)
    }

    fn local_records(&self, table: &str, identity: &str) -> Result<BTreeMap<String, Value>> {
        let config = self.detector.config();
        let owned = self
            .store
            .get_all(table)?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| record_id(record, &config.owner_field).as_deref() == Some(identity))
            .collect();
        Ok(self.keyed(table, owned))
    }

    fn keyed(&self, table: &str, records: Vec<Value>) -> BTreeMap<String, Value> {
        let id_field = &self.detector.config().id_field;
        let mut keyed = BTreeMap::new();
        for record in records {
            match record_id(&record, id_field) {
                Some(id) => {
                    keyed.insert(id, record);
                }
                None => tracing::warn!(table, "skipping record without an id"),
            }
        }
        keyed
    }
}

#[cfg(test)]
#[path = "consistency_tests.rs"]
mod tests;
