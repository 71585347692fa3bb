//! In-memory tables flowing between pipeline stages.
//!
//! A [`Table`] is an ordered list of unique column labels and rows of
//! [`Cell`]s. Tables are never mutated in place by the pipeline; every stage
//! builds a new one from the previous stage's output.

use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::data::Cell;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(anyhow!(
                    "Row {} has {} cell(s) but the table has {} column(s)",
                    idx + 1,
                    row.len(),
                    columns.len()
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Convenience constructor for literal tables, mostly used by tests.
    pub fn from_literal(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|raw| Cell::from(*raw)).collect())
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Share of rows whose cell in `idx` is missing; `None` for an empty table.
    pub fn missing_fraction(&self, idx: usize) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        let missing = self.column_cells(idx).filter(|c| c.is_missing()).count();
        Some(missing as f64 / self.rows.len() as f64)
    }

    /// Sets every row of `name` to `value`, appending the column when absent.
    pub fn with_constant_column(&self, name: &str, value: Cell) -> Table {
        let mut columns = self.columns.clone();
        let mut rows = self.rows.clone();
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                columns.push(name.to_string());
                for row in &mut rows {
                    row.push(value.clone());
                }
            }
        }
        Table { columns, rows }
    }

    /// Keeps the rows for which `keep` holds, in their original order.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }

    pub fn drop_columns(&self, names: &[String]) -> Table {
        let kept = self
            .columns
            .iter()
            .filter(|c| !names.contains(c))
            .cloned()
            .collect::<Vec<_>>();
        self.select(&kept)
    }

    /// Restricts the table to `names`, in that order. Every name must exist.
    pub fn project(&self, names: &[String]) -> Result<Table> {
        if let Some(missing) = names.iter().find(|n| !self.has_column(n)) {
            return Err(anyhow!("Column '{missing}' not found in table"));
        }
        Ok(self.select(names))
    }

    /// Restricts the table to those of `names` it has, in that order.
    pub fn select(&self, names: &[String]) -> Table {
        let indices = names
            .iter()
            .filter_map(|n| self.column_index(n))
            .collect::<Vec<_>>();
        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table { columns, rows }
    }

    /// Appends the rows of `other`, which must share this table's columns.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if other.columns != self.columns {
            return Err(anyhow!(
                "Cannot append table with columns {:?} onto {:?}",
                other.columns,
                self.columns
            ));
        }
        self.rows.extend(other.rows);
        Ok(())
    }
}

/// One source file's table together with the year parsed from its name.
#[derive(Debug, Clone)]
pub struct YearTable {
    pub year: i32,
    pub source: PathBuf,
    pub table: Table,
}
