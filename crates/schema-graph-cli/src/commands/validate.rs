//! `schema-graph validate` - re-check invariants against a serialized artifact.
//!
//! Operates on generic JSON rather than deserializing back into `Node`/`Edge`:
//! the column-statistics family block is an untagged enum at serialization
//! time, which would be structurally ambiguous to deserialize. This command
//! never needs to reconstruct the typed graph, only to re-check it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use crate::commands::print_info;
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to a previously written JSON artifact.
    #[arg(long)]
    pub artifact: PathBuf,
}

pub fn execute(args: ValidateArgs, global: &GlobalOptions) -> Result<()> {
    let content = std::fs::read_to_string(&args.artifact)
        .with_context(|| format!("failed to read artifact: {}", args.artifact.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("artifact is not valid JSON: {}", args.artifact.display()))?;

    let report = check_invariants(&document)?;
    for violation in &report.violations {
        print_info(&format!("violation: {violation}"), global.quiet);
    }

    print_info(
        &format!(
            "{} nodes, {} edges, {} violations",
            report.node_count,
            report.edge_count,
            report.violations.len()
        ),
        global.quiet,
    );

    if !report.violations.is_empty() {
        bail!("artifact failed validation with {} violation(s)", report.violations.len());
    }
    Ok(())
}

struct Report {
    node_count: usize,
    edge_count: usize,
    violations: Vec<String>,
}

/// Re-checks I1–I6 against a deserialized JSON document without
/// reconstructing the typed graph.
fn check_invariants(document: &Value) -> Result<Report> {
    let nodes = document
        .get("nodes")
        .and_then(Value::as_array)
        .context("artifact missing 'nodes' array")?;
    let edges = document
        .get("edges")
        .and_then(Value::as_array)
        .context("artifact missing 'edges' array")?;

    let mut violations = Vec::new();
    let mut table_keys = std::collections::HashSet::new();
    let mut column_keys = std::collections::HashSet::new();

    for node in nodes {
        let node_type = node.get("type").and_then(Value::as_str);
        match node_type {
            Some("Table") => {
                if let Some(name) = node.get("name").and_then(Value::as_str) {
                    if !table_keys.insert(name.to_string()) {
                        violations.push(format!("duplicate table node: {name}"));
                    }
                } else {
                    violations.push("Table node missing 'name'".to_string());
                }
            }
            Some("Column") => {
                let belongs_to = node.get("belongs_to").and_then(Value::as_str);
                let name = node.get("name").and_then(Value::as_str);
                match (belongs_to, name) {
                    (Some(table), Some(column)) => {
                        let key = format!("{table}.{column}");
                        if !column_keys.insert(key.clone()) {
                            violations.push(format!("duplicate column node: {key}"));
                        }
                    }
                    _ => violations.push("Column node missing 'belongs_to' or 'name'".to_string()),
                }
                if node.get("null_count").is_none() {
                    violations.push(format!(
                        "Column node {:?} missing common-block statistics (null_count)",
                        node.get("name")
                    ));
                }
            }
            other => violations.push(format!("node with unrecognized type discriminator: {other:?}")),
        }
    }

    for edge in edges {
        let edge_type = edge.get("type").and_then(Value::as_str);
        match edge_type {
            Some("HAS_COLUMN") => {}
            Some("FOREIGN_KEY") => {
                if edge.get("fk_hash").and_then(Value::as_str).is_none() {
                    violations.push("ForeignKey edge missing fk_hash".to_string());
                }
            }
            other => violations.push(format!("edge with unrecognized type discriminator: {other:?}")),
        }
    }

    Ok(Report {
        node_count: nodes.len(),
        edge_count: edges.len(),
        violations,
    })
}
