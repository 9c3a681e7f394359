// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync configuration.
//!
//! Stored as TOML (usually `config.toml` in the data directory). Every field
//! has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [queue]
//! default_max_retries = 3
//!
//! [retry]
//! base_delay_ms = 1000
//! network_base_delay_ms = 2000
//!
//! [processor]
//! batch_size = 10
//! concurrency = 4
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::operation::Priority;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub conflicts: ConflictConfig,
}

/// Operation queue settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Retry budget for operations enqueued without an explicit one.
    #[serde(default = "default_max_retries")]
    pub default_max_retries: u32,
    /// Priority for operations enqueued without an explicit one.
    #[serde(default)]
    pub default_priority: Priority,
    /// Completed operations older than this are removed by cleanup.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    /// Store collection holding the queue.
    #[serde(default = "default_queue_collection")]
    pub collection: String,
}

/// Backoff settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay for application and unclassified errors (ms).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Base delay for network-class errors (ms).
    #[serde(default = "default_network_base_delay_ms")]
    pub network_base_delay_ms: u64,
    /// Upper bound for any single delay (ms).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Lower bound of the random jitter fraction.
    #[serde(default = "default_jitter_min")]
    pub jitter_min: f64,
    /// Upper bound of the random jitter fraction.
    #[serde(default = "default_jitter_max")]
    pub jitter_max: f64,
}

/// Drain loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Maximum operations taken per drain cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum concurrent remote calls within a batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-operation dispatch timeout (ms).
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    /// First idle delay after an empty cycle (ms).
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    /// Cap for the growing idle delay (ms).
    #[serde(default = "default_max_idle_delay_ms")]
    pub max_idle_delay_ms: u64,
    /// Consecutive empty cycles before the loop suspends until new work arrives.
    #[serde(default = "default_suspend_after_empty")]
    pub suspend_after_empty: u32,
    /// Serialize operations touching the same `(entity, entity_id)`.
    #[serde(default = "default_true")]
    pub serialize_per_entity: bool,
}

/// Conflict detection and resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Field holding the record identity.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Field holding the owning identity (user) of a record.
    #[serde(default = "default_owner_field")]
    pub owner_field: String,
    /// Last-modified marker used for tie-breaking.
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
    /// Creation marker used to spot independent creates.
    #[serde(default = "default_created_field")]
    pub created_field: String,
    /// Deletion marker (tombstone) used to spot delete conflicts.
    #[serde(default = "default_deleted_field")]
    pub deleted_field: String,
    /// Fields never compared (e.g. server-maintained bookkeeping).
    #[serde(default)]
    pub ignored_fields: Vec<String>,
    /// Priority of the UPDATE queued after a resolution.
    #[serde(default = "default_propagation_priority")]
    pub propagation_priority: Priority,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retention_hours() -> u64 {
    24
}

fn default_queue_collection() -> String {
    "sync_queue".to_string()
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_network_base_delay_ms() -> u64 {
    2_000
}

fn default_max_delay_ms() -> u64 {
    300_000
}

fn default_jitter_min() -> f64 {
    0.10
}

fn default_jitter_max() -> f64 {
    0.20
}

fn default_batch_size() -> usize {
    10
}

fn default_concurrency() -> usize {
    4
}

fn default_operation_timeout_ms() -> u64 {
    30_000
}

fn default_idle_delay_ms() -> u64 {
    1_000
}

fn default_max_idle_delay_ms() -> u64 {
    30_000
}

fn default_suspend_after_empty() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_owner_field() -> String {
    "user_id".to_string()
}

fn default_timestamp_field() -> String {
    "updated_at".to_string()
}

fn default_created_field() -> String {
    "created_at".to_string()
}

fn default_deleted_field() -> String {
    "deleted_at".to_string()
}

fn default_propagation_priority() -> Priority {
    Priority::High
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            default_max_retries: default_max_retries(),
            default_priority: Priority::default(),
            retention_hours: default_retention_hours(),
            collection: default_queue_collection(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            base_delay_ms: default_base_delay_ms(),
            network_base_delay_ms: default_network_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_min: default_jitter_min(),
            jitter_max: default_jitter_max(),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            operation_timeout_ms: default_operation_timeout_ms(),
            idle_delay_ms: default_idle_delay_ms(),
            max_idle_delay_ms: default_max_idle_delay_ms(),
            suspend_after_empty: default_suspend_after_empty(),
            serialize_per_entity: default_true(),
        }
    }
}

impl Default for ConflictConfig {
    fn default() -> Self {
        ConflictConfig {
            id_field: default_id_field(),
            owner_field: default_owner_field(),
            timestamp_field: default_timestamp_field(),
            created_field: default_created_field(),
            deleted_field: default_deleted_field(),
            ignored_fields: Vec::new(),
            propagation_priority: default_propagation_priority(),
        }
    }
}

impl SyncConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Loads configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses and validates configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let retry = &self.retry;
        if retry.base_delay_ms == 0 || retry.network_base_delay_ms == 0 {
            return Err(Error::Config("retry base delays must be positive".to_string()));
        }
        if retry.max_delay_ms == 0 {
            return Err(Error::Config("retry.max_delay_ms must be positive".to_string()));
        }
        let jitter_range = 0.0..=1.0;
        if !jitter_range.contains(&retry.jitter_min)
            || !jitter_range.contains(&retry.jitter_max)
            || retry.jitter_min > retry.jitter_max
        {
            return Err(Error::Config(format!(
                "invalid jitter range {}..{}: bounds must satisfy 0 <= min <= max <= 1",
                retry.jitter_min, retry.jitter_max
            )));
        }

        let processor = &self.processor;
        if processor.batch_size == 0 || processor.concurrency == 0 {
            return Err(Error::Config(
                "processor.batch_size and processor.concurrency must be positive".to_string(),
            ));
        }
        if processor.operation_timeout_ms == 0 || processor.idle_delay_ms == 0 {
            return Err(Error::Config(
                "processor timeouts and idle delay must be positive".to_string(),
            ));
        }

        if self.queue.collection.trim().is_empty() {
            return Err(Error::Config("queue.collection must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
