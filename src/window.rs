//! Year-window partitioning and persistence of the pipeline outputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use serde::Serialize;

use crate::{
    cleaner::LogRecord,
    config::{YEAR_COLUMN, YearWindow},
    data::Cell,
    frame::Table,
    io_utils,
};

#[derive(Debug, Clone)]
pub struct WindowPartition {
    pub window: YearWindow,
    pub table: Table,
}

/// What was written for one window.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenWindow {
    pub name: String,
    pub start: i32,
    pub end: i32,
    pub rows: usize,
    pub columns: usize,
    pub path: PathBuf,
}

/// Splits `combined` by the `Year` column. Rows outside every window are
/// left out of all partitions.
pub fn split_windows(combined: &Table, windows: &[YearWindow]) -> Result<Vec<WindowPartition>> {
    let year_idx = combined
        .column_index(YEAR_COLUMN)
        .ok_or_else(|| anyhow!("Combined table has no '{YEAR_COLUMN}' column"))?;

    let year_of = |row: &[Cell]| row[year_idx].as_number().map(|y| y as i32);

    let partitions = windows
        .iter()
        .map(|window| WindowPartition {
            window: window.clone(),
            table: combined.filter_rows(|row| year_of(row).is_some_and(|y| window.contains(y))),
        })
        .collect::<Vec<_>>();

    let outside = combined
        .rows()
        .iter()
        .filter(|row| {
            year_of(row.as_slice()).is_none_or(|y| !windows.iter().any(|w| w.contains(y)))
        })
        .count();
    if outside > 0 {
        debug!("{outside} row(s) fall outside every year window");
    }
    Ok(partitions)
}

pub fn write_partitions(
    dir: &Path,
    partitions: &[WindowPartition],
    delimiter: u8,
) -> Result<Vec<WrittenWindow>> {
    partitions
        .iter()
        .map(|partition| {
            let path = dir.join(&partition.window.file_name);
            io_utils::write_table(&path, &partition.table, delimiter)
                .with_context(|| format!("Writing window '{}'", partition.window.name))?;
            info!(
                "Wrote {} row(s) for {}-{} to {:?}",
                partition.table.row_count(),
                partition.window.start,
                partition.window.end,
                path
            );
            Ok(WrittenWindow {
                name: partition.window.name.clone(),
                start: partition.window.start,
                end: partition.window.end,
                rows: partition.table.row_count(),
                columns: partition.table.column_count(),
                path,
            })
        })
        .collect()
}

/// Writes the log records sorted by year.
pub fn write_log(path: &Path, records: &[LogRecord], delimiter: u8) -> Result<()> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.year);

    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    for record in &sorted {
        writer
            .serialize(record)
            .with_context(|| format!("Writing log record for {} to {:?}", record.year, path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing log file {path:?}"))?;
    info!("Wrote cleaning log for {} year(s) to {:?}", sorted.len(), path);
    Ok(())
}
