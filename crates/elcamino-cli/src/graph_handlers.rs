//! Handler functions for `list` and the graph CLI commands.
//!
//! These functions implement `list`, `graph validate`, `graph order`, and
//! `graph stats` over a registry. None of them runs a producer.

use std::io::Write;

use elcamino_core::{Commands, Error, Result};
use elcamino_graph::{ValidationIssue, command_order, compute_stats, resolution_order, validate};
use serde::Serialize;

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::msg(e.to_string()))?;
    writeln!(out, "{json}")?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// List registered commands and dependencies with their declared edges.
pub fn handle_list<W: Write>(commands: &Commands, out: &mut W) -> Result<()> {
    let registered = commands.command_registry().collect();
    writeln!(out, "Commands ({}):", registered.len())?;
    for (name, entry) in &registered {
        let required = &entry.metadata().required;
        if required.is_empty() {
            writeln!(out, "  {name}")?;
        } else {
            writeln!(out, "  {name} <- {}", required.join(", "))?;
        }
    }

    let registered = commands.dependency_registry().collect();
    writeln!(out, "Dependencies ({}):", registered.len())?;
    for (name, entry) in &registered {
        let meta = entry.metadata();
        let mut line = format!("  {name}");
        if !meta.required.is_empty() {
            line.push_str(&format!(" <- {}", meta.required.join(", ")));
        }
        if !meta.optional.is_empty() {
            line.push_str(&format!(" (possibly {})", meta.optional.join(", ")));
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Validate the registry graph.
///
/// Fails when the registry has validation errors, after printing them.
pub fn handle_validate<W: Write>(commands: &Commands, json: bool, out: &mut W) -> Result<()> {
    let result = validate(commands);

    if json {
        write_json(out, &result)?;
    } else {
        if result.valid {
            writeln!(out, "Registry is valid.")?;
        } else {
            writeln!(out, "Registry has validation issues:")?;
        }
        write_issues(out, "ERROR", &result.errors)?;
        write_issues(out, "WARN ", &result.warnings)?;
        write_issues(out, "INFO ", &result.info)?;
        writeln!(
            out,
            "\nSummary: {} error(s), {} warning(s)",
            result.errors.len(),
            result.warnings.len()
        )?;
    }

    if result.valid {
        Ok(())
    } else {
        Err(Error::msg(format!(
            "Registry validation failed with {} error(s)",
            result.errors.len()
        )))
    }
}

fn write_issues<W: Write>(out: &mut W, label: &str, issues: &[ValidationIssue]) -> Result<()> {
    for issue in issues {
        writeln!(out, "  {label} [{}]: {}", issue.code, issue.message)?;
        for node in &issue.nodes {
            writeln!(out, "    - {node}")?;
        }
        for edge in &issue.edges {
            writeln!(out, "    - {edge}")?;
        }
    }
    Ok(())
}

/// Show the order in which dependencies would be produced.
///
/// With `as_commands`, `names` are commands and their declared dependencies
/// are resolved together.
pub fn handle_order<W: Write>(
    commands: &Commands,
    names: &[String],
    as_commands: bool,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let order = if as_commands {
        let mut order: Vec<String> = Vec::new();
        for command in names {
            for name in command_order(commands, command)? {
                if !order.contains(&name) {
                    order.push(name);
                }
            }
        }
        order
    } else {
        resolution_order(commands, names)?
    };

    if json {
        write_json(out, &order)
    } else {
        for (step, name) in order.iter().enumerate() {
            writeln!(out, "{:>3}. {name}", step + 1)?;
        }
        Ok(())
    }
}

/// Show registry statistics.
pub fn handle_stats<W: Write>(commands: &Commands, json: bool, out: &mut W) -> Result<()> {
    let stats = compute_stats(commands);
    if json {
        return write_json(out, &stats);
    }

    writeln!(out, "Registry Statistics")?;
    writeln!(out, "===================")?;
    writeln!(out, "Dependencies:   {}", stats.dependencies)?;
    writeln!(out, "Commands:       {}", stats.commands)?;
    writeln!(out, "Missing names:  {}", stats.missing)?;
    writeln!(out, "Required edges: {}", stats.required_edges)?;
    writeln!(out, "Optional edges: {}", stats.optional_edges)?;
    writeln!(out, "Command edges:  {}", stats.command_edges)?;
    match stats.max_depth {
        Some(depth) => writeln!(out, "Max depth:      {depth}")?,
        None => writeln!(out, "Max depth:      (cycle)")?,
    }
    if let Some(name) = &stats.most_required {
        writeln!(out, "Most required:  {name}")?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
