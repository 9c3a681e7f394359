// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Data directory layout.
//!
//! The data directory holds:
//! - `config.toml`: the [`SyncConfig`] (queue, retry, processor, conflicts)
//! - `sync.db`: the SQLite store with queued operations and conflicts
//!
//! It is chosen from `--data-dir`, then `FITSYNC_DATA_DIR`, then the
//! platform data directory (`~/.local/share/fitsync` on Linux).

use std::fs;
use std::path::{Path, PathBuf};

use fitsync_core::SyncConfig;

use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "fitsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "sync.db";

/// Resolves the data directory. `explicit` already folds in the environment
/// variable (clap reads `FITSYNC_DATA_DIR` into the flag).
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => dirs::data_dir().map(|d| d.join(APP_DIR_NAME)).ok_or(Error::NoDataDir),
    }
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

/// Loads the config of an initialized data directory.
pub fn load_config(data_dir: &Path) -> Result<SyncConfig> {
    let path = config_path(data_dir);
    if !path.is_file() {
        return Err(Error::NotInitialized(path));
    }
    SyncConfig::load(&path).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Creates the data directory and writes a default config.
///
/// Refuses to touch an existing config unless `force` is set.
pub fn init_data_dir(data_dir: &Path, force: bool) -> Result<SyncConfig> {
    let path = config_path(data_dir);
    if path.exists() && !force {
        return Err(Error::AlreadyInitialized(data_dir.to_path_buf()));
    }

    fs::create_dir_all(data_dir)?;
    let config = SyncConfig::default();
    config.save(&path)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
