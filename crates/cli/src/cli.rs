// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use fitsync_core::{OpStatus, OpType, Priority, ResolutionKind};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_op_type(s: &str) -> Result<OpType, String> {
    s.parse().map_err(|e: fitsync_core::Error| e.to_string())
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse().map_err(|e: fitsync_core::Error| e.to_string())
}

fn parse_status(s: &str) -> Result<OpStatus, String> {
    s.parse().map_err(|e: fitsync_core::Error| e.to_string())
}

fn parse_strategy(s: &str) -> Result<ResolutionKind, String> {
    s.parse().map_err(|e: fitsync_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// Bare ids, one per line
    Id,
}

#[derive(Parser)]
#[command(name = "fitsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and operate the fitsync offline sync queue")]
#[command(
    long_about = "Inspect and operate the fitsync offline sync queue.\n\n\
    Queued mutations, their retry state, and unresolved conflicts live in a\n\
    SQLite store under the data directory."
)]
pub struct Cli {
    /// Data directory holding config.toml and sync.db
    #[arg(long, global = true, value_name = "DIR", env = "FITSYNC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the data directory with a default config and an empty store
    Init {
        /// Overwrite an existing config.toml with defaults
        #[arg(long)]
        force: bool,
    },

    /// Queue an operation
    #[command(after_help = "\
Examples:
  fitsync add create workouts '{\"id\":\"w1\",\"reps\":10}'
  fitsync add update profile '{\"id\":\"u1\",\"name\":\"Sam\"}' -p high
  fitsync add delete meals '{\"id\":\"m1\"}' -o id")]
    Add {
        /// Operation type (create, update, delete)
        #[arg(value_parser = parse_op_type)]
        op_type: OpType,

        /// Entity (table) name
        #[arg(value_parser = non_empty_string)]
        entity: String,

        /// Payload as a JSON object
        payload: String,

        /// Priority (low, medium, high)
        #[arg(long, short, value_parser = parse_priority)]
        priority: Option<Priority>,

        /// Retry budget for this operation
        #[arg(long)]
        max_retries: Option<u32>,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show outstanding operations in dispatch order
    Pending {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List operations, optionally filtered by status
    List {
        /// Status filter (pending, processing, completed, failed); repeatable
        #[arg(long, short, value_parser = parse_status)]
        status: Vec<OpStatus>,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show operation counts by status
    Stats {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show one operation
    Show {
        id: String,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Delete completed operations older than the retention window
    Cleanup {
        /// Age threshold in hours (defaults to queue.retention_hours)
        #[arg(long, value_name = "HOURS")]
        older_than: Option<u64>,
    },

    /// Return operations interrupted mid-dispatch to pending
    Recover,

    /// Queue a fresh copy of a failed operation
    #[command(arg_required_else_help = true)]
    Retry {
        id: String,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Delete an operation regardless of status
    #[command(arg_required_else_help = true)]
    Remove { id: String },

    /// Inspect and resolve conflicts
    #[command(subcommand)]
    Conflicts(ConflictsCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConflictsCommand {
    /// List unresolved conflicts, oldest first
    List {
        /// Only conflicts for this entity
        #[arg(long, short)]
        entity: Option<String>,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show one conflict with its field differences
    Show {
        id: String,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Compare a local and a remote copy and record a conflict if they diverge
    #[command(after_help = "\
Examples:
  fitsync conflicts detect workouts '{\"id\":\"w1\",\"reps\":8}' '{\"id\":\"w1\",\"reps\":12}'")]
    Detect {
        #[arg(value_parser = non_empty_string)]
        entity: String,

        /// Local copy as a JSON object
        local: String,

        /// Remote copy as a JSON object
        remote: String,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Resolve a conflict and queue the result for propagation
    #[command(after_help = "\
Examples:
  fitsync conflicts resolve cf-1a2b remote
  fitsync conflicts resolve cf-1a2b merge --preview
  fitsync conflicts resolve cf-1a2b manual --record '{\"id\":\"w1\",\"reps\":10}'")]
    Resolve {
        id: String,

        /// Strategy (local_wins, remote_wins, merge, manual)
        #[arg(value_parser = parse_strategy)]
        strategy: ResolutionKind,

        /// Canonical record for the manual strategy, as a JSON object
        #[arg(long)]
        record: Option<String>,

        /// Print the reconciled record without applying it
        #[arg(long)]
        preview: bool,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show past resolutions, newest first
    History {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the config file location
    Path,
}

#[cfg(test)]
#[path = "cli_tests/mod.rs"]
mod tests;
