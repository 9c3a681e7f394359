// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use fitsync_core::SyncConfig;

use crate::cli::OutputFormat;
use crate::config::config_path;
use crate::error::{Error, Result};

/// Renders the effective configuration, defaults included.
pub fn render(config: &SyncConfig, output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        OutputFormat::Text | OutputFormat::Id => {
            toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))
        }
    }
}

pub fn show(config: &SyncConfig, output: OutputFormat) -> Result<()> {
    println!("{}", render(config, output)?.trim_end());
    Ok(())
}

pub fn path(data_dir: &Path) -> Result<()> {
    println!("{}", config_path(data_dir).display());
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
