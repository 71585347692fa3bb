//! Per-year cleaning of a single cost report table.
//!
//! [`clean_year()`] runs the fixed sequence of stages against one
//! [`YearTable`] and returns the cleaned table together with a [`LogRecord`]
//! describing how many rows and columns survived each stage:
//!
//! 1. tag every row with the file's year in a `Year` column;
//! 2. mark columns whose missing share reaches the threshold;
//! 3. keep proprietary facilities only (categorical control-type codes);
//! 4. drop the marked columns and the configured drop list;
//! 5. project onto `Year` plus the resolved target variables;
//! 6. discard rows with any missing kept value.
//!
//! Unresolvable targets are soft failures: they are listed in the log record
//! and processing continues.

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    columns::{ColumnMap, Resolution, ResolutionKind},
    config::{PipelineConfig, YEAR_COLUMN},
    data::{Cell, format_number, normalize_label},
    frame::{Table, YearTable},
};

/// The subset of [`PipelineConfig`] that drives a single year's cleaning.
#[derive(Debug, Clone)]
pub struct CleaningRules {
    pub targets: Vec<String>,
    pub drop: Vec<String>,
    pub missing_threshold: f64,
    pub categorical_column: String,
    pub accepted_codes: Vec<i64>,
}

impl From<&PipelineConfig> for CleaningRules {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            targets: config.targets.clone(),
            drop: config.drop.clone(),
            missing_threshold: config.missing_threshold,
            categorical_column: config.categorical.column.clone(),
            accepted_codes: config.categorical.accepted.clone(),
        }
    }
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// One row of the cleaning log. Field names are the persisted CSV headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub year: i32,
    pub n_rows_original: usize,
    pub n_rows_after_filter: usize,
    pub n_rows_final: usize,
    pub n_cols_original: usize,
    pub n_cols_after_drop: usize,
    pub kept_columns_count: usize,
    pub missing_target_vars_count: usize,
    pub missing_target_vars: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetResolution {
    pub target: String,
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub year: i32,
    pub table: Table,
}

#[derive(Debug, Clone)]
pub struct YearOutcome {
    pub cleaned: CleanedTable,
    pub log: LogRecord,
    pub resolutions: Vec<TargetResolution>,
}

impl YearOutcome {
    pub fn unresolved_targets(&self) -> impl Iterator<Item = &str> + '_ {
        self.resolutions
            .iter()
            .filter(|r| r.resolution.is_none())
            .map(|r| r.target.as_str())
    }
}

pub fn clean_year(input: &YearTable, rules: &CleaningRules) -> YearOutcome {
    let original = &input.table;
    let colmap = ColumnMap::build(original.columns());

    let tagged = original.with_constant_column(YEAR_COLUMN, Cell::Number(f64::from(input.year)));

    let high_missing = high_missing_columns(&tagged, rules.missing_threshold);
    if !high_missing.is_empty() {
        debug!(
            "{}: {} column(s) at or above {:.0}% missing",
            input.year,
            high_missing.len(),
            rules.missing_threshold * 100.0
        );
    }

    let filtered = filter_categorical(&tagged, &colmap, rules, input.year);

    let drop_listed = colmap
        .resolve_drop_set(&rules.drop)
        .into_iter()
        .filter(|label| filtered.has_column(label))
        .collect::<Vec<_>>();
    let to_drop = high_missing
        .into_iter()
        .chain(drop_listed)
        .filter(|label| label != YEAR_COLUMN)
        .unique()
        .collect::<Vec<_>>();
    let pruned = filtered.drop_columns(&to_drop);

    let resolutions = resolve_targets(&colmap, &pruned, &rules.targets, input.year);
    let keep = std::iter::once(YEAR_COLUMN.to_string())
        .chain(
            resolutions
                .iter()
                .filter_map(|r| r.resolution.as_ref())
                .map(|r| r.label.clone()),
        )
        .unique()
        .collect::<Vec<_>>();
    let projected = pruned.select(&keep);
    let cleaned = projected.filter_rows(|row| row.iter().all(|cell| !cell.is_missing()));

    let missing_targets = resolutions
        .iter()
        .filter(|r| r.resolution.is_none())
        .map(|r| r.target.clone())
        .collect::<Vec<_>>();

    let log = LogRecord {
        year: input.year,
        n_rows_original: original.row_count(),
        n_rows_after_filter: filtered.row_count(),
        n_rows_final: cleaned.row_count(),
        n_cols_original: original.column_count(),
        n_cols_after_drop: pruned.column_count(),
        kept_columns_count: projected.column_count(),
        missing_target_vars_count: missing_targets.len(),
        missing_target_vars: missing_targets.join("; "),
    };

    info!(
        "{}: {} -> {} -> {} row(s), {} -> {} -> {} column(s), {} unresolved target(s)",
        log.year,
        log.n_rows_original,
        log.n_rows_after_filter,
        log.n_rows_final,
        log.n_cols_original,
        log.n_cols_after_drop,
        log.kept_columns_count,
        log.missing_target_vars_count
    );

    YearOutcome {
        cleaned: CleanedTable {
            year: input.year,
            table: cleaned,
        },
        log,
        resolutions,
    }
}

/// Columns other than `Year` whose missing share is at or above `threshold`.
pub fn high_missing_columns(table: &Table, threshold: f64) -> Vec<String> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() != YEAR_COLUMN)
        .filter(|(idx, _)| {
            table
                .missing_fraction(*idx)
                .is_some_and(|fraction| fraction >= threshold)
        })
        .map(|(_, name)| name.clone())
        .collect()
}

/// Keeps rows whose control-type code is accepted.
///
/// Values are compared numerically first. Only when no row at all matches
/// numerically are trimmed text values compared against the codes instead.
/// Without a resolvable categorical column the table passes through.
pub fn filter_categorical(
    table: &Table,
    colmap: &ColumnMap,
    rules: &CleaningRules,
    year: i32,
) -> Table {
    let key = normalize_label(&rules.categorical_column);
    let Some(idx) = colmap.get(&key).and_then(|label| table.column_index(label)) else {
        info!(
            "{year}: column '{}' not found, skipping categorical filter",
            rules.categorical_column
        );
        return table.clone();
    };

    let numeric_matches = |cell: &Cell| {
        cell.as_number()
            .is_some_and(|value| rules.accepted_codes.iter().any(|&code| value == code as f64))
    };
    if table.column_cells(idx).any(numeric_matches) {
        return table.filter_rows(|row| numeric_matches(&row[idx]));
    }

    let accepted_text = rules
        .accepted_codes
        .iter()
        .map(|&code| format_number(code as f64))
        .collect::<Vec<_>>();
    debug!("{year}: no numeric control-type match, comparing as text");
    table.filter_rows(|row| match &row[idx] {
        Cell::Text(text) => accepted_text.iter().any(|code| code == text.trim()),
        _ => false,
    })
}

/// Resolves every target against the labels still present in `table`.
pub fn resolve_targets(
    colmap: &ColumnMap,
    table: &Table,
    targets: &[String],
    year: i32,
) -> Vec<TargetResolution> {
    targets
        .iter()
        .map(|target| {
            let resolution = colmap.resolve_where(target, |label| table.has_column(label));
            match &resolution {
                Some(Resolution {
                    label,
                    kind: ResolutionKind::Exact,
                }) => debug!("{year}: '{target}' -> '{label}' (exact)"),
                Some(Resolution {
                    label,
                    kind: ResolutionKind::Substring,
                }) => info!("{year}: '{target}' -> '{label}' (substring match)"),
                None => info!("{year}: target '{target}' not found"),
            }
            TargetResolution {
                target: target.clone(),
                resolution,
            }
        })
        .collect()
}
