// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod conflicts;
pub mod init;
pub mod queue;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::Path;
use std::sync::Arc;

use fitsync_core::{
    ClockSource, ConflictDetector, ConflictResolver, ConflictSet, DurableStore, OperationQueue,
    SqliteStore, SyncConfig, SystemClock,
};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::config::{db_path, load_config};
use crate::error::{Error, Result};

/// Everything a command needs: the loaded config and the components
/// opened over the store.
pub struct Context {
    pub config: SyncConfig,
    pub queue: Arc<OperationQueue>,
    pub conflicts: Arc<ConflictSet>,
    pub resolver: ConflictResolver,
    pub detector: ConflictDetector,
}

impl Context {
    /// Opens the SQLite store of an initialized data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = load_config(data_dir)?;
        let store = Arc::new(SqliteStore::open(&db_path(data_dir))?);
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    pub fn with_store(
        config: SyncConfig,
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self> {
        let queue = Arc::new(OperationQueue::open(Arc::clone(&store), Arc::clone(&clock), config.queue.clone())?);
        let conflicts = Arc::new(ConflictSet::open(Arc::clone(&store), Arc::clone(&clock))?);
        let resolver =
            ConflictResolver::new(store, Arc::clone(&queue), Arc::clone(&conflicts), config.conflicts.clone());
        let detector = ConflictDetector::new(config.conflicts.clone(), clock);
        Ok(Context { config, queue, conflicts, resolver, detector })
    }
}

/// Parses a command-line argument that must be a JSON object.
pub(crate) fn parse_json_object(what: &'static str, input: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(input).map_err(|e| Error::InvalidJson { what, reason: e.to_string() })?;
    if !value.is_object() {
        return Err(Error::InvalidJson { what, reason: "expected a JSON object".to_string() });
    }
    Ok(value)
}

/// Prints a list in the requested format. `Id` prints one id per line.
pub(crate) fn print_list<T: Serialize>(
    items: &[T],
    output: OutputFormat,
    empty: &str,
    id: impl Fn(&T) -> &str,
    line: impl Fn(&T) -> String,
) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Id => {
            for item in items {
                println!("{}", id(item));
            }
        }
        OutputFormat::Text if items.is_empty() => println!("{empty}"),
        OutputFormat::Text => {
            for item in items {
                println!("{}", line(item));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
