//! Cross-year schema reconciliation.
//!
//! Target variables that cannot be resolved in some year leave that year's
//! cleaned table narrower than the others. Reconciliation keeps only the
//! columns every year shares, so a variable missing from any single year is
//! removed from the combined output for all years.

use std::collections::BTreeSet;

use anyhow::Result;
use log::info;

use crate::{cleaner::CleanedTable, error::PipelineError, frame::Table};

#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Shared columns in lexicographic order.
    pub common_columns: Vec<String>,
    /// Every input table projected onto `common_columns`, in input order.
    pub tables: Vec<CleanedTable>,
}

impl Reconciled {
    /// Concatenates the projected tables in input order.
    pub fn combine(&self) -> Result<Table> {
        let mut combined = Table::new(self.common_columns.clone(), Vec::new())?;
        for cleaned in &self.tables {
            combined.append(cleaned.table.clone())?;
        }
        Ok(combined)
    }
}

pub fn common_columns(tables: &[CleanedTable]) -> Result<Vec<String>, PipelineError> {
    let (first, rest) = tables
        .split_first()
        .ok_or(PipelineError::EmptyReconciliation)?;
    let mut shared = first.table.columns().iter().cloned().collect::<BTreeSet<_>>();
    for cleaned in rest {
        shared.retain(|column| cleaned.table.has_column(column));
    }
    Ok(shared.into_iter().collect())
}

pub fn reconcile(tables: &[CleanedTable]) -> Result<Reconciled> {
    let common = common_columns(tables)?;
    let mut projected = Vec::with_capacity(tables.len());
    for cleaned in tables {
        let removed = cleaned
            .table
            .columns()
            .iter()
            .filter(|column| !common.contains(column))
            .collect::<Vec<_>>();
        if !removed.is_empty() {
            info!(
                "{}: {} column(s) not shared by every year removed: {:?}",
                cleaned.year,
                removed.len(),
                removed
            );
        }
        projected.push(CleanedTable {
            year: cleaned.year,
            table: cleaned.table.project(&common)?,
        });
    }
    Ok(Reconciled {
        common_columns: common,
        tables: projected,
    })
}
