// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fitsync-core: offline sync primitives for the fitsync engine.
//!
//! This crate provides the synchronous building blocks: the durable store
//! abstraction, the operation queue and its retry policy, conflict
//! detection, merging and resolution, and configuration. The async drain
//! loop and consistency checker live in `fitsync-engine`.

pub mod clock;
pub mod config;
pub mod conflict;
pub mod detect;
pub mod error;
pub mod events;
pub mod id;
pub mod merge;
pub mod operation;
pub mod queue;
pub mod resolve;
pub mod retry;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use config::{ConflictConfig, ProcessorConfig, QueueConfig, RetryConfig, SyncConfig};
pub use conflict::{
    ConflictRecord, ConflictSet, ConflictType, Difference, DifferenceKind, ResolutionKind,
    ResolvedConflict,
};
pub use detect::ConflictDetector;
pub use error::{Error, Result};
pub use events::{ListenerId, QueueEvent};
pub use merge::{FieldMerge, FieldPreferences};
pub use operation::{OpStatus, OpType, Priority, QueueStats, SyncOperation};
pub use queue::{OperationQueue, RecoveryReport};
pub use resolve::{ConflictResolver, Resolution};
pub use retry::{ErrorClass, Failure, RetryDecision, RetryPolicy};
pub use store::{DurableStore, MemoryStore, SqliteStore, StoreError, UndecodableRow};
