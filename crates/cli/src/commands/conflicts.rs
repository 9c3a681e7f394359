// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fitsync_core::{ConflictRecord, Resolution, ResolutionKind};

use super::{parse_json_object, print_list, Context};
use crate::cli::OutputFormat;
use crate::display::{format_conflict_details, format_conflict_line, format_resolution_line};
use crate::error::{Error, Result};

fn print_conflict(conflict: &ConflictRecord, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(conflict)?),
        OutputFormat::Id => println!("{}", conflict.id),
        OutputFormat::Text => print!("{}", format_conflict_details(conflict)),
    }
    Ok(())
}

pub fn list(ctx: &Context, entity: Option<&str>, output: OutputFormat) -> Result<()> {
    let conflicts = match entity {
        Some(entity) => ctx.conflicts.list_for_entity(entity)?,
        None => ctx.conflicts.list()?,
    };
    print_list(&conflicts, output, "No unresolved conflicts.", |c| &c.id, format_conflict_line)
}

pub fn show(ctx: &Context, id: &str, output: OutputFormat) -> Result<()> {
    let conflict = ctx.conflicts.require(id)?;
    print_conflict(&conflict, output)
}

/// Compares two copies of a record and records the conflict, replacing any
/// earlier one for the same record.
pub fn detect(ctx: &Context, entity: &str, local: &str, remote: &str, output: OutputFormat) -> Result<()> {
    let local = parse_json_object("local record", local)?;
    let remote = parse_json_object("remote record", remote)?;

    let Some(conflict) = ctx.detector.detect(entity, &local, &remote)? else {
        if output == OutputFormat::Text {
            println!("No conflict: both copies agree.");
        }
        return Ok(());
    };

    if let Some(replaced) = ctx.conflicts.record(&conflict)? {
        tracing::debug!(replaced = %replaced.id, id = %conflict.id, "replaced earlier conflict");
    }
    print_conflict(&conflict, output)
}

pub fn resolve(
    ctx: &Context,
    id: &str,
    strategy: ResolutionKind,
    record: Option<&str>,
    preview: bool,
    output: OutputFormat,
) -> Result<()> {
    if strategy == ResolutionKind::Manual && record.is_none() {
        return Err(Error::RecordRequired);
    }
    let record = record.map(|r| parse_json_object("record", r)).transpose()?;
    let resolution = Resolution::from_parts(strategy, record)?;

    if preview {
        let conflict = ctx.conflicts.require(id)?;
        let merged = ctx.resolver.preview(&conflict, &resolution)?;
        println!("{}", serde_json::to_string_pretty(&merged)?);
        return Ok(());
    }

    let resolved = ctx.resolver.resolve(id, resolution)?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        OutputFormat::Id => println!("{}", resolved.operation_id),
        OutputFormat::Text => println!(
            "Resolved {} with {}; queued {}",
            resolved.conflict.id, resolved.strategy, resolved.operation_id
        ),
    }
    Ok(())
}

pub fn history(ctx: &Context, output: OutputFormat) -> Result<()> {
    let resolved = ctx.conflicts.history()?;
    print_list(&resolved, output, "No resolved conflicts.", |r| &r.conflict.id, format_resolution_line)
}

#[cfg(test)]
#[path = "conflicts_tests.rs"]
mod tests;
