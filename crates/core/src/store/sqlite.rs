// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{DurableStore, ScannedRow, StoreError, StoreResult, UndecodableRow};

/// SQL schema for the record store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
"#;

/// Durable store persisted in a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a store at the given path, creating the file and schema if needed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let store = SqliteStore { conn: Mutex::new(conn) };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = SqliteStore { conn: Mutex::new(Connection::open_in_memory()?) };
        store.init()?;
        Ok(store)
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn)
    }

    fn raw_rows(&self, collection: &str) -> StoreResult<Vec<(String, String)>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, data FROM records WHERE collection = ?1 ORDER BY id")?;
            let rows = stmt
                .query_map(params![collection], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn decode(collection: &str, id: &str, data: &str) -> StoreResult<Value> {
    serde_json::from_str(data).map_err(|e| StoreError::Corrupted {
        collection: collection.to_string(),
        id: id.to_string(),
        reason: e.to_string(),
    })
}

impl DurableStore for SqliteStore {
    fn init(&self) -> StoreResult<()> {
        self.with_conn(|conn| Ok(conn.execute_batch(SCHEMA)?))
    }

    fn put(&self, collection: &str, id: &str, record: &Value) -> StoreResult<()> {
        let data = serde_json::to_string(record)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO records (collection, id, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(collection, id) DO UPDATE SET
                     data = excluded.data,
                     updated_at = excluded.updated_at",
                params![collection, id, data, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.with_conn(|conn| {
            let data: Option<String> = conn
                .query_row(
                    "SELECT data FROM records WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| row.get(0),
                )
                .optional()?;
            data.map(|data| decode(collection, id, &data)).transpose()
        })
    }

    fn get_all(&self, collection: &str) -> StoreResult<Vec<(String, Value)>> {
        self.raw_rows(collection)?
            .into_iter()
            .map(|(id, data)| -> StoreResult<(String, Value)> {
                let value = decode(collection, &id, &data)?;
                Ok((id, value))
            })
            .collect()
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<ScannedRow>> {
        Ok(self
            .raw_rows(collection)?
            .into_iter()
            .map(|(id, data)| {
                let value = serde_json::from_str::<Value>(&data)
                    .map_err(|e| UndecodableRow { reason: e.to_string(), raw: data });
                (id, value)
            })
            .collect())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )?;
            Ok(removed > 0)
        })
    }

    fn clear_collection(&self, collection: &str) -> StoreResult<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM records WHERE collection = ?1", params![collection])?)
        })
    }

    fn clear(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM records", [])?;
            Ok(())
        })
    }
}
