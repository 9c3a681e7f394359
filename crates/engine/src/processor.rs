// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue processor: the drain loop.
//!
//! Exactly one drain loop may run per processor, enforced by an
//! `is_processing` flag shared between the background loop and
//! [`QueueProcessor::drain_once`]. Each cycle:
//!
//! 1. takes a bounded batch of ready operations in dispatch order
//! 2. marks each one `processing` (persisted before any network call)
//! 3. dispatches the batch with bounded concurrency, each call under a timeout
//! 4. applies the outcome of each call independently as it completes
//!
//! When a cycle finds nothing to do the loop sleeps: until the earliest
//! scheduled retry if one exists, otherwise for a growing idle delay, and
//! after enough consecutive empty cycles it suspends until the next enqueue.
//!
//! Stopping never cancels in-flight calls. Operations left `processing` by a
//! forced shutdown or crash are requeued on the next [`QueueProcessor::start`].

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fitsync_core::{
    Error, ListenerId, OperationQueue, ProcessorConfig, QueueEvent, RetryDecision, RetryPolicy,
    SyncOperation,
};
use futures_util::{stream, FutureExt, StreamExt};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{EngineError, Result};
use crate::executor::{ExecuteError, RemoteExecutor};

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Operations handed to the executor.
    pub dispatched: usize,
    pub completed: usize,
    /// Operations sent back to `pending` with a backoff.
    pub retried: usize,
    /// Operations that reached terminal `failed`.
    pub failed: usize,
    /// Storage errors hit while claiming or applying outcomes.
    pub errors: usize,
    /// Earliest scheduled retry still waiting after this cycle.
    pub next_retry_at: Option<u64>,
}

/// How [`QueueProcessor::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The loop finished its in-flight batch and exited.
    Graceful,
    /// The loop did not exit in time and was aborted.
    Forced,
}

/// Snapshot of the processor's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStatus {
    pub running: bool,
    pub suspended: bool,
    pub cycles: u64,
    pub consecutive_empty: u32,
}

struct Shared {
    queue: Arc<OperationQueue>,
    executor: Arc<dyn RemoteExecutor>,
    policy: RetryPolicy,
    config: ProcessorConfig,
    wake: Arc<Notify>,
    /// Re-entrancy guard: set while any drain (loop or single cycle) runs.
    is_processing: AtomicBool,
    loop_active: AtomicBool,
    stop_requested: AtomicBool,
    suspended: AtomicBool,
    cycles: AtomicU64,
    consecutive_empty: AtomicU32,
}

/// Drives operations from the queue to the remote executor.
pub struct QueueProcessor {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
    listener: ListenerId,
}

impl QueueProcessor {
    pub fn new(
        queue: Arc<OperationQueue>,
        executor: Arc<dyn RemoteExecutor>,
        policy: RetryPolicy,
        config: ProcessorConfig,
    ) -> Self {
        let wake = Arc::new(Notify::new());
        let enqueue_wake = Arc::clone(&wake);
        let listener = queue.add_listener(move |event| {
            if matches!(event, QueueEvent::Enqueued(_)) {
                enqueue_wake.notify_one();
            }
        });

        QueueProcessor {
            shared: Arc::new(Shared {
                queue,
                executor,
                policy,
                config,
                wake,
                is_processing: AtomicBool::new(false),
                loop_active: AtomicBool::new(false),
                stop_requested: AtomicBool::new(false),
                suspended: AtomicBool::new(false),
                cycles: AtomicU64::new(0),
                consecutive_empty: AtomicU32::new(0),
            }),
            task: Mutex::new(None),
            listener,
        }
    }

    /// Starts the background drain loop on the current tokio runtime.
    ///
    /// Operations left `processing` by a previous run are requeued first.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let shared = &self.shared;
        if shared.is_processing.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning);
        }
        shared.stop_requested.store(false, Ordering::SeqCst);
        shared.consecutive_empty.store(0, Ordering::SeqCst);

        match shared.queue.recover_interrupted() {
            Ok(report) if !report.requeued.is_empty() => {
                tracing::info!(count = report.requeued.len(), "requeued interrupted operations");
            }
            Ok(_) => {}
            Err(e) => {
                shared.is_processing.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        }

        shared.loop_active.store(true, Ordering::SeqCst);
        let handle = runtime.spawn(run_loop(Arc::clone(shared)));
        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        tracing::info!("queue processor started");
        Ok(())
    }

    /// Asks the loop to stop after its current batch. Does not wait.
    pub fn stop(&self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    /// Stops the loop and waits up to `timeout` for the in-flight batch,
    /// aborting the loop task if it does not finish in time.
    pub async fn shutdown(&self, timeout: Duration) -> ShutdownOutcome {
        self.stop();
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(mut task) = task else {
            return ShutdownOutcome::Graceful;
        };

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(_) => ShutdownOutcome::Graceful,
            Err(_) => {
                task.abort();
                let shared = &self.shared;
                shared.loop_active.store(false, Ordering::SeqCst);
                shared.suspended.store(false, Ordering::SeqCst);
                shared.is_processing.store(false, Ordering::SeqCst);
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "forced queue processor shutdown");
                ShutdownOutcome::Forced
            }
        }
    }

    /// Runs a single drain cycle on the caller's task.
    ///
    /// Refused while the background loop (or another cycle) is running.
    pub async fn drain_once(&self) -> Result<DrainReport> {
        let shared = &self.shared;
        if shared.is_processing.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning);
        }
        let _processing = ProcessingGuard(&shared.is_processing);
        let result = shared.drain_cycle().await;
        shared.cycles.fetch_add(1, Ordering::SeqCst);
        Ok(result?)
    }

    /// True while the background loop is active.
    pub fn is_running(&self) -> bool {
        self.shared.loop_active.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> ProcessorStatus {
        let shared = &self.shared;
        ProcessorStatus {
            running: shared.loop_active.load(Ordering::SeqCst),
            suspended: shared.suspended.load(Ordering::SeqCst),
            cycles: shared.cycles.load(Ordering::SeqCst),
            consecutive_empty: shared.consecutive_empty.load(Ordering::SeqCst),
        }
    }
}

/// Clears `is_processing` when a single cycle ends, including when the
/// caller drops the `drain_once` future mid-cycle.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Drop for QueueProcessor {
    fn drop(&mut self) {
        self.stop();
        self.shared.queue.remove_listener(self.listener);
    }
}

async fn run_loop(shared: Arc<Shared>) {
    let config = &shared.config;
    let mut idle_delay = config.idle_delay_ms;

    while !shared.stop_requested.load(Ordering::SeqCst) {
        let cycle = shared.drain_cycle().await;
        shared.cycles.fetch_add(1, Ordering::SeqCst);

        let report = match cycle {
            Ok(report) if report.dispatched > 0 => {
                shared.consecutive_empty.store(0, Ordering::SeqCst);
                idle_delay = config.idle_delay_ms;
                continue;
            }
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "drain cycle failed");
                shared.sleep_or_wake(idle_delay).await;
                idle_delay = idle_delay.saturating_mul(2).min(config.max_idle_delay_ms);
                continue;
            }
        };

        let empty = shared.consecutive_empty.fetch_add(1, Ordering::SeqCst) + 1;
        match report.next_retry_at {
            Some(at) => {
                let now = shared.queue.clock().now_ms();
                shared.sleep_or_wake(at.saturating_sub(now).max(1)).await;
            }
            None if empty >= config.suspend_after_empty => {
                shared.suspended.store(true, Ordering::SeqCst);
                tracing::debug!(empty_cycles = empty, "queue processor suspended");
                shared.wake.notified().await;
                shared.suspended.store(false, Ordering::SeqCst);
                idle_delay = config.idle_delay_ms;
            }
            None => {
                shared.sleep_or_wake(idle_delay).await;
                idle_delay = idle_delay.saturating_mul(2).min(config.max_idle_delay_ms);
            }
        }
    }

    shared.loop_active.store(false, Ordering::SeqCst);
    shared.is_processing.store(false, Ordering::SeqCst);
    tracing::info!("queue processor stopped");
}

impl Shared {
    async fn sleep_or_wake(&self, ms: u64) {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
            _ = self.wake.notified() => {}
        }
    }

    async fn drain_cycle(&self) -> fitsync_core::Result<DrainReport> {
        let batch = self.queue.ready_operations(self.config.batch_size, self.config.serialize_per_entity)?;
        let mut report = DrainReport::default();

        let mut claimed = Vec::with_capacity(batch.len());
        for op in batch {
            match self.queue.mark_processing(&op.id) {
                Ok(op) => claimed.push(op),
                // Removed or moved on since the batch was read.
                Err(e @ (Error::OperationNotFound(_) | Error::InvalidTransition { .. })) => {
                    tracing::debug!(id = %op.id, error = %e, "skipping operation");
                }
                Err(e) if claimed.is_empty() => return Err(e),
                Err(e) => {
                    tracing::error!(id = %op.id, error = %e, "failed to claim operation");
                    report.errors += 1;
                    break;
                }
            }
        }
        report.dispatched = claimed.len();

        if !claimed.is_empty() {
            let timeout_ms = self.config.operation_timeout_ms;
            let mut results = stream::iter(claimed)
                .map(|op| {
                    let executor = Arc::clone(&self.executor);
                    async move {
                        let outcome = dispatch(executor.as_ref(), &op, timeout_ms).await;
                        (op, outcome)
                    }
                })
                .buffer_unordered(self.config.concurrency.max(1));

            while let Some((op, outcome)) = results.next().await {
                if let Err(e) = self.apply_outcome(&op, outcome, &mut report) {
                    tracing::error!(id = %op.id, error = %e, "failed to record operation outcome");
                    report.errors += 1;
                }
            }
        }

        report.next_retry_at = self.queue.next_retry_at()?;
        Ok(report)
    }

    fn apply_outcome(
        &self,
        op: &SyncOperation,
        outcome: std::result::Result<(), ExecuteError>,
        report: &mut DrainReport,
    ) -> fitsync_core::Result<()> {
        let error = match outcome {
            Ok(()) => {
                self.queue.mark_completed(&op.id)?;
                tracing::debug!(id = %op.id, entity = %op.entity, "operation completed");
                report.completed += 1;
                return Ok(());
            }
            Err(error) => error,
        };

        let message = error.to_string();
        let now = self.queue.clock().now_ms();
        match self.policy.decide(op, &error.failure(), now) {
            RetryDecision::Retry { next_retry_at, delay_ms, class } => {
                tracing::warn!(
                    id = %op.id,
                    attempt = op.retry_count + 1,
                    delay_ms,
                    %class,
                    error = %message,
                    "scheduling retry"
                );
                self.queue.schedule_retry(&op.id, &message, next_retry_at)?;
                report.retried += 1;
            }
            RetryDecision::Fail { class, exhausted } => {
                tracing::warn!(id = %op.id, %class, exhausted, error = %message, "operation failed");
                self.queue.mark_failed(&op.id, &message)?;
                report.failed += 1;
            }
        }
        Ok(())
    }
}

async fn dispatch(
    executor: &dyn RemoteExecutor,
    op: &SyncOperation,
    timeout_ms: u64,
) -> std::result::Result<(), ExecuteError> {
    let call = AssertUnwindSafe(executor.execute(op)).catch_unwind();
    match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ExecuteError::remote("remote executor panicked")),
        Err(_) => Err(ExecuteError::Timeout(timeout_ms)),
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
