// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue observer interface.
//!
//! Listeners are fire-and-forget: they run synchronously after the store
//! write that produced the event, and a panicking listener is logged and
//! skipped without affecting the queue or other listeners.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::operation::{OpStatus, SyncOperation};

/// Something that happened to a queued operation.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// A new operation was persisted.
    Enqueued(SyncOperation),
    /// An operation moved between statuses. Carries the updated operation.
    StatusChanged { operation: SyncOperation, from: OpStatus, to: OpStatus },
    /// An operation was deleted (manually or by cleanup).
    Removed { id: String },
}

impl QueueEvent {
    /// Id of the operation the event refers to.
    pub fn operation_id(&self) -> &str {
        match self {
            QueueEvent::Enqueued(op) => &op.id,
            QueueEvent::StatusChanged { operation, .. } => &operation.id,
            QueueEvent::Removed { id } => id,
        }
    }
}

/// Handle returned by `add_listener`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&QueueEvent) + Send + Sync>;

/// Registry of queue listeners.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Listener)>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).push((id, Arc::new(listener)));
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers an event to every listener.
    ///
    /// The registry lock is released before listeners run, so a listener may
    /// add or remove listeners without deadlocking.
    pub fn emit(&self, event: &QueueEvent) {
        let snapshot: Vec<Listener> = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!(operation = event.operation_id(), "queue listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
