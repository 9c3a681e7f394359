// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue inspection and maintenance commands.

use fitsync_core::{OpStatus, OpType, Priority, SyncOperation};

use super::{parse_json_object, print_list, Context};
use crate::cli::OutputFormat;
use crate::display::{format_operation_details, format_operation_line, format_stats};
use crate::error::Result;

fn print_operation(op: &SyncOperation, output: OutputFormat, text: impl FnOnce(&SyncOperation) -> String) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(op)?),
        OutputFormat::Id => println!("{}", op.id),
        OutputFormat::Text => println!("{}", text(op)),
    }
    Ok(())
}

fn require(ctx: &Context, id: &str) -> Result<SyncOperation> {
    ctx.queue
        .get(id)?
        .ok_or_else(|| fitsync_core::Error::OperationNotFound(id.to_string()).into())
}

pub fn add(
    ctx: &Context,
    op_type: OpType,
    entity: &str,
    payload: &str,
    priority: Option<Priority>,
    max_retries: Option<u32>,
    output: OutputFormat,
) -> Result<()> {
    let payload = parse_json_object("payload", payload)?;
    let id = ctx.queue.add_operation(op_type, entity, payload, priority, max_retries)?;
    let op = require(ctx, &id)?;
    print_operation(&op, output, |op| format!("Queued {}", format_operation_line(op).trim_start_matches("- ")))
}

pub fn pending(ctx: &Context, output: OutputFormat) -> Result<()> {
    let ops = ctx.queue.get_pending_operations()?;
    print_list(&ops, output, "No pending operations.", |op| &op.id, format_operation_line)
}

/// Lists operations in dispatch order. Several statuses are OR'ed.
pub fn list(ctx: &Context, statuses: &[OpStatus], output: OutputFormat) -> Result<()> {
    let mut ops = ctx.queue.all_operations()?;
    if !statuses.is_empty() {
        ops.retain(|op| statuses.contains(&op.status));
    }
    print_list(&ops, output, "No operations.", |op| &op.id, format_operation_line)
}

pub fn stats(ctx: &Context, output: OutputFormat) -> Result<()> {
    let stats = ctx.queue.stats()?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text | OutputFormat::Id => print!("{}", format_stats(&stats)),
    }
    Ok(())
}

pub fn show(ctx: &Context, id: &str, output: OutputFormat) -> Result<()> {
    let op = require(ctx, id)?;
    match output {
        OutputFormat::Text => print!("{}", format_operation_details(&op)),
        _ => print_operation(&op, output, format_operation_line)?,
    }
    Ok(())
}

pub fn cleanup(ctx: &Context, older_than_hours: Option<u64>) -> Result<()> {
    let hours = older_than_hours.unwrap_or(ctx.config.queue.retention_hours);
    let removed = ctx.queue.cleanup_completed(hours)?;
    println!("Removed {} completed operation(s) older than {}h", removed, hours);
    Ok(())
}

pub fn recover(ctx: &Context) -> Result<()> {
    let report = ctx.queue.recover_interrupted()?;
    if report.is_empty() {
        println!("Nothing to recover.");
        return Ok(());
    }
    for id in &report.requeued {
        println!("requeued {}", id);
    }
    for id in &report.quarantined {
        println!("quarantined {}", id);
    }
    Ok(())
}

/// Queues a fresh copy of a failed operation; the original stays as it is.
pub fn retry(ctx: &Context, id: &str, output: OutputFormat) -> Result<()> {
    let new_id = ctx.queue.requeue_failed(id)?;
    let op = require(ctx, &new_id)?;
    print_operation(&op, output, |op| format!("Queued {} as a retry of {}", op.id, id))
}

pub fn remove(ctx: &Context, id: &str) -> Result<()> {
    if !ctx.queue.remove_operation(id)? {
        return Err(fitsync_core::Error::OperationNotFound(id.to_string()).into());
    }
    println!("Removed {}", id);
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
