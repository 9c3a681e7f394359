// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fitsync - operator CLI for the offline sync queue.
//!
//! This crate backs the `fitsync` binary, which inspects and maintains the
//! durable store used by the sync engine: queued operations, their retry
//! state, and unresolved conflicts.
//!
//! # Main Components
//!
//! - [`Cli`] - argument definitions
//! - [`config`] - data directory layout (`config.toml`, `sync.db`)
//! - [`Error`] - error type with operator hints
//!
//! # Usage
//!
//! ```rust,ignore
//! use clap::Parser;
//! use fitsync_cli::{run, Cli};
//!
//! let cli = Cli::parse_from(["fitsync", "--data-dir", "/tmp/fitsync", "init"]);
//! run(cli)?;
//! ```

mod cli;
mod commands;
mod display;

pub mod config;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command, ConfigCommand, ConflictsCommand, OutputFormat};
pub use error::{Error, Result};

use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;

use commands::Context;

/// Execute a parsed command line. This is the main entry point for library
/// users and runs commands without spawning a process.
pub fn run(cli: Cli) -> Result<()> {
    if let Command::Completion { shell } = cli.command {
        generate(shell, &mut Cli::command(), "fitsync", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = config::resolve_data_dir(cli.data_dir)?;
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");
    match cli.command {
        Command::Init { force } => commands::init::run(&data_dir, force),
        Command::Config(ConfigCommand::Path) => commands::config::path(&data_dir),
        command => run_impl(&data_dir, command),
    }
}

/// Runs a command that needs an initialized data directory.
fn run_impl(data_dir: &Path, command: Command) -> Result<()> {
    let ctx = Context::open(data_dir)?;
    match command {
        Command::Add { op_type, entity, payload, priority, max_retries, output } => {
            commands::queue::add(&ctx, op_type, &entity, &payload, priority, max_retries, output)
        }
        Command::Pending { output } => commands::queue::pending(&ctx, output),
        Command::List { status, output } => commands::queue::list(&ctx, &status, output),
        Command::Stats { output } => commands::queue::stats(&ctx, output),
        Command::Show { id, output } => commands::queue::show(&ctx, &id, output),
        Command::Cleanup { older_than } => commands::queue::cleanup(&ctx, older_than),
        Command::Recover => commands::queue::recover(&ctx),
        Command::Retry { id, output } => commands::queue::retry(&ctx, &id, output),
        Command::Remove { id } => commands::queue::remove(&ctx, &id),
        Command::Conflicts(cmd) => match cmd {
            ConflictsCommand::List { entity, output } => {
                commands::conflicts::list(&ctx, entity.as_deref(), output)
            }
            ConflictsCommand::Show { id, output } => commands::conflicts::show(&ctx, &id, output),
            ConflictsCommand::Detect { entity, local, remote, output } => {
                commands::conflicts::detect(&ctx, &entity, &local, &remote, output)
            }
            ConflictsCommand::Resolve { id, strategy, record, preview, output } => {
                commands::conflicts::resolve(&ctx, &id, strategy, record.as_deref(), preview, output)
            }
            ConflictsCommand::History { output } => commands::conflicts::history(&ctx, output),
        },
        Command::Config(ConfigCommand::Show { output }) => commands::config::show(&ctx.config, output),
        Command::Init { .. } | Command::Completion { .. } | Command::Config(ConfigCommand::Path) => {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
