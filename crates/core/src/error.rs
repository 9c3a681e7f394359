// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fitsync-core operations.

use thiserror::Error;

use crate::store::StoreError;

/// All possible errors that can occur in fitsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error("conflict not found: {0}")]
    ConflictNotFound(String),

    #[error("invalid status transition for {id}: cannot go from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("invalid operation type: '{0}'\n  hint: valid types are: create, update, delete")]
    InvalidOpType(String),

    #[error("invalid priority: '{0}'\n  hint: valid priorities are: low, medium, high")]
    InvalidPriority(String),

    #[error("invalid status: '{0}'\n  hint: valid statuses are: pending, processing, completed, failed")]
    InvalidStatus(String),

    #[error("invalid strategy: '{0}'\n  hint: valid strategies are: local_wins, remote_wins, merge, manual")]
    InvalidStrategy(String),

    #[error("resolved record does not match conflict: expected {expected}, got {actual}")]
    EntityMismatch { expected: String, actual: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for fitsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
