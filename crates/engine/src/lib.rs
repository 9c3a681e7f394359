// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fitsync-engine: the async half of the offline sync subsystem.
//!
//! Builds on `fitsync-core` with a tokio drain loop that pushes queued
//! operations through a [`RemoteExecutor`], and a consistency checker that
//! compares local records with a [`RemoteSource`] and feeds conflicts to the
//! resolver. [`SyncEngine`] wires it all together.

pub mod clock;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod executor;
pub mod processor;

pub use clock::TokioClock;
pub use consistency::{
    CheckSummary, ConsistencyChecker, ConsistencyReport, RepairSummary, TableFailure,
};
pub use engine::{SyncEngine, SyncEngineBuilder};
pub use error::{EngineError, Result};
pub use executor::{BoxFuture, ExecuteError, RemoteError, RemoteExecutor, RemoteSource};
pub use processor::{DrainReport, ProcessorStatus, QueueProcessor, ShutdownOutcome};
