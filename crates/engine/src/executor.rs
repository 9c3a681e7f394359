// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote backend abstraction.
//!
//! The engine never talks to the network itself. Writes go through a
//! [`RemoteExecutor`] and reads (for consistency checks) through a
//! [`RemoteSource`], so the backend can be swapped for a mock in tests.

use std::future::Future;
use std::pin::Pin;

use fitsync_core::{Failure, SyncOperation};
use serde_json::Value;

/// Boxed future returned by the remote traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for remote writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    /// The backend rejected or failed the request.
    #[error("{message}")]
    Remote { message: String, status: Option<u16> },

    /// No response within the dispatch timeout.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// The executor does not know how to apply this operation
    /// (unknown entity, malformed payload).
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl ExecuteError {
    /// A failure without a status code.
    pub fn remote(message: impl Into<String>) -> Self {
        ExecuteError::Remote { message: message.into(), status: None }
    }

    /// A failure carrying the backend's status code.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ExecuteError::Remote { message: message.into(), status: Some(status) }
    }

    /// View consumed by the retry policy's classifier.
    pub fn failure(&self) -> Failure {
        match self {
            ExecuteError::Remote { message, status: Some(status) } => {
                Failure::with_status(message.clone(), *status)
            }
            ExecuteError::Remote { message, status: None } => Failure::new(message.clone()),
            ExecuteError::Timeout(_) => Failure::with_status(self.to_string(), 408),
            ExecuteError::Unsupported(_) => Failure::with_status(self.to_string(), 422),
        }
    }
}

/// Applies queued operations to the remote backend.
pub trait RemoteExecutor: Send + Sync {
    /// Performs the network call for one operation.
    ///
    /// Only success or failure matters to the engine; any internal retrying
    /// the executor does is invisible to it.
    fn execute<'a>(&'a self, operation: &'a SyncOperation) -> BoxFuture<'a, Result<(), ExecuteError>>;
}

/// Error type for remote reads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The backend could not be reached.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an error.
    #[error("remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Read API of the remote backend.
pub trait RemoteSource: Send + Sync {
    /// Every record of `table` owned by `identity`.
    fn fetch_all<'a>(&'a self, table: &'a str, identity: &'a str) -> BoxFuture<'a, Result<Vec<Value>, RemoteError>>;
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
