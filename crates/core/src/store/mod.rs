// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key/value storage with collection semantics.
//!
//! Everything above this layer (operation queue, conflict set, resolved
//! entity records) persists through [`DurableStore`]. Records are JSON values
//! addressed by `(collection, id)`; `put` is last-write-wins.
//!
//! Two adapters ship with the crate:
//! - [`SqliteStore`] - on-disk, survives process restarts
//! - [`MemoryStore`] - ephemeral, for tests and throwaway sessions

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde_json::Value;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record could not be decoded.
    #[error("corrupted record {collection}/{id}: {reason}")]
    Corrupted { collection: String, id: String, reason: String },

    /// The backing store refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A stored row whose text is not valid JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndecodableRow {
    /// The stored text, verbatim.
    pub raw: String,
    pub reason: String,
}

/// One row of [`DurableStore::scan`].
pub type ScannedRow = (String, Result<Value, UndecodableRow>);

/// Abstract durable key/value persistence.
///
/// Implementations must be safe to share between threads; every call is a
/// synchronous write-through, there is no buffering above the store.
pub trait DurableStore: Send + Sync {
    /// Prepares the backing storage. Idempotent.
    fn init(&self) -> StoreResult<()>;

    /// Inserts or replaces the record stored under `(collection, id)`.
    fn put(&self, collection: &str, id: &str, record: &Value) -> StoreResult<()>;

    /// Fetches a single record.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Fetches every record in a collection as `(id, record)` pairs, ordered by id.
    ///
    /// Fails with [`StoreError::Corrupted`] if any row does not decode.
    fn get_all(&self, collection: &str) -> StoreResult<Vec<(String, Value)>>;

    /// Like [`get_all`](Self::get_all), but decodes each row on its own so a
    /// single bad row does not hide the rest of the collection.
    fn scan(&self, collection: &str) -> StoreResult<Vec<ScannedRow>> {
        Ok(self.get_all(collection)?.into_iter().map(|(id, value)| (id, Ok(value))).collect())
    }

    /// Deletes a record. Returns true if something was removed.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Removes every record in one collection. Returns the number removed.
    fn clear_collection(&self, collection: &str) -> StoreResult<usize>;

    /// Removes every record in every collection.
    fn clear(&self) -> StoreResult<()>;
}

impl<S: DurableStore + ?Sized> DurableStore for std::sync::Arc<S> {
    fn init(&self) -> StoreResult<()> {
        (**self).init()
    }

    fn put(&self, collection: &str, id: &str, record: &Value) -> StoreResult<()> {
        (**self).put(collection, id, record)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        (**self).get(collection, id)
    }

    fn get_all(&self, collection: &str) -> StoreResult<Vec<(String, Value)>> {
        (**self).get_all(collection)
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<ScannedRow>> {
        (**self).scan(collection)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        (**self).delete(collection, id)
    }

    fn clear_collection(&self, collection: &str) -> StoreResult<usize> {
        (**self).clear_collection(collection)
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
