// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use fitsync_core::SqliteStore;

use crate::config::{db_path, init_data_dir};
use crate::error::Result;

pub fn run(data_dir: &Path, force: bool) -> Result<()> {
    init_data_dir(data_dir, force)?;
    // Opening creates the database file and its schema.
    SqliteStore::open(&db_path(data_dir))?;

    tracing::info!(data_dir = %data_dir.display(), force, "initialized data directory");
    println!("Initialized fitsync in {}", data_dir.display());
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
