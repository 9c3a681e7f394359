// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the `fitsync` CLI.
///
/// Messages carry hints for the common operator mistakes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: no config at {}\n  hint: run 'fitsync init' first", .0.display())]
    NotInitialized(PathBuf),

    #[error("already initialized at {}\n  hint: pass --force to reset the config", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("no data directory could be determined\n  hint: pass --data-dir or set FITSYNC_DATA_DIR")]
    NoDataDir,

    #[error("invalid {what}: {reason}\n  hint: pass a JSON object, e.g. '{{\"id\":\"w1\"}}'")]
    InvalidJson { what: &'static str, reason: String },

    #[error("the manual strategy requires --record")]
    RecordRequired,

    #[error(transparent)]
    Core(#[from] fitsync_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl From<fitsync_core::StoreError> for Error {
    fn from(e: fitsync_core::StoreError) -> Self {
        Error::Core(e.into())
    }
}

/// A specialized Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
