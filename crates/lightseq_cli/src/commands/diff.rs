//! Diff command implementation.

use lightseq_protocol::{
    diff, Document, NodeFields, Operation, OperationKind, PlaylistFields, ProjectFields,
    SequenceFields, TableName, TableSchema, WireOperation,
};
use serde::Serialize;
use std::path::Path;

/// Operations between two snapshots of a table.
#[derive(Debug, Serialize)]
pub struct DiffReport {
    /// Table the snapshots belong to.
    pub table: TableName,
    /// Number of inserts.
    pub inserts: usize,
    /// Number of patches.
    pub patches: usize,
    /// Number of deletes.
    pub deletes: usize,
    /// Operations in send order.
    pub operations: Vec<WireOperation>,
}

/// Runs the diff command.
pub fn run(
    table: TableName,
    previous: &Path,
    current: &Path,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = compute(table, previous, current)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_text_output(&report)?;
        }
    }

    Ok(())
}

/// Loads both snapshots with the table's schema and diffs them.
pub fn compute(
    table: TableName,
    previous: &Path,
    current: &Path,
) -> Result<DiffReport, Box<dyn std::error::Error>> {
    let operations = match table {
        TableName::Projects => diff_files::<ProjectFields>(previous, current)?,
        TableName::Playlists => diff_files::<PlaylistFields>(previous, current)?,
        TableName::Sequences => diff_files::<SequenceFields>(previous, current)?,
        TableName::Nodes => diff_files::<NodeFields>(previous, current)?,
    };

    let count = |kind| operations.iter().filter(|op| op.kind() == kind).count();
    Ok(DiffReport {
        table,
        inserts: count(OperationKind::Insert),
        patches: count(OperationKind::Patch),
        deletes: count(OperationKind::Delete),
        operations,
    })
}

fn diff_files<F: TableSchema>(
    previous: &Path,
    current: &Path,
) -> Result<Vec<WireOperation>, Box<dyn std::error::Error>> {
    let previous: Vec<Document<F>> = load(previous)?;
    let current: Vec<Document<F>> = load(current)?;
    let wire = diff(&previous, &current)
        .iter()
        .map(Operation::to_wire)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(wire)
}

fn load<F: TableSchema>(path: &Path) -> Result<Vec<Document<F>>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let documents = serde_json::from_str(&text).map_err(|e| {
        format!(
            "{} is not a {} snapshot: {e}",
            path.display(),
            F::TABLE
        )
    })?;
    Ok(documents)
}

fn print_text_output(report: &DiffReport) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{}: {} insert(s), {} patch(es), {} delete(s)",
        report.table, report.inserts, report.patches, report.deletes
    );
    for op in &report.operations {
        match op.values() {
            Some(values) => println!(
                "  {:<6} {} {}",
                op.kind().to_string(),
                op.target(),
                serde_json::to_string(values)?
            ),
            None => println!("  {:<6} {}", op.kind().to_string(), op.target()),
        }
    }
    Ok(())
}
