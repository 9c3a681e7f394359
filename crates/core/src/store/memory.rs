// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{DurableStore, StoreResult};

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// In-memory store. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Collections) -> T) -> T {
        let mut guard = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl DurableStore for MemoryStore {
    fn init(&self) -> StoreResult<()> {
        Ok(())
    }

    fn put(&self, collection: &str, id: &str, record: &Value) -> StoreResult<()> {
        self.with(|c| {
            c.entry(collection.to_string()).or_default().insert(id.to_string(), record.clone());
        });
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self.with(|c| c.get(collection).and_then(|records| records.get(id).cloned())))
    }

    fn get_all(&self, collection: &str) -> StoreResult<Vec<(String, Value)>> {
        Ok(self.with(|c| {
            c.get(collection)
                .map(|records| records.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default()
        }))
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        Ok(self.with(|c| c.get_mut(collection).is_some_and(|records| records.remove(id).is_some())))
    }

    fn clear_collection(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.with(|c| c.remove(collection).map_or(0, |records| records.len())))
    }

    fn clear(&self) -> StoreResult<()> {
        self.with(|c| c.clear());
        Ok(())
    }
}
