// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fitsync-engine.

use thiserror::Error;

use crate::executor::RemoteError;

/// All possible errors raised by the engine layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] fitsync_core::Error),

    #[error("queue processor is already running")]
    AlreadyRunning,

    #[error("no tokio runtime available to run the queue processor")]
    NoRuntime,

    #[error("remote fetch failed for table '{table}': {source}")]
    Remote {
        table: String,
        #[source]
        source: RemoteError,
    },

    #[error("no remote source configured\n  hint: build the engine with a remote source to run consistency checks")]
    NoRemoteSource,
}

impl From<fitsync_core::StoreError> for EngineError {
    fn from(e: fitsync_core::StoreError) -> Self {
        EngineError::Core(e.into())
    }
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
