//! Descriptive statistics over cleaned window files.
//!
//! Prints four reports over the concatenation of the given files: summary
//! statistics per numeric column, the target's distribution per group value,
//! the columns most correlated with the target, and yearly means.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use encoding_rs::UTF_8;
use itertools::Itertools;
use log::info;

use crate::{
    cli::ProfileArgs,
    config::YEAR_COLUMN,
    data::{DEFAULT_MISSING_MARKERS, format_number},
    frame::Table,
    io_utils, table,
};

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let combined = load_combined(args)?;
    info!(
        "Profiling {} row(s) from {} file(s)",
        combined.row_count(),
        args.inputs.len()
    );
    let numeric = numeric_columns(&combined);

    println!("Summary statistics");
    let stats_rows = numeric
        .iter()
        .filter(|&&idx| combined.columns()[idx] != YEAR_COLUMN)
        .map(|&idx| {
            let name = &combined.columns()[idx];
            ColumnStats::from_values(name, column_values(&combined, idx)).render_row()
        })
        .collect::<Vec<_>>();
    table::print_table(
        &strings(&["column", "count", "min", "max", "mean", "median", "std_dev"]),
        &stats_rows,
    );

    let target_idx = combined
        .column_index(&args.target)
        .ok_or_else(|| anyhow!("Target column '{}' not found", args.target))?;

    if let Some(group_idx) = combined.column_index(&args.group_by) {
        println!();
        println!("{} by {}", args.target, args.group_by);
        let rows = grouped_distribution(&combined, group_idx, target_idx)
            .into_iter()
            .map(|(group, summary)| summary.render_row(&group))
            .collect::<Vec<_>>();
        table::print_table(
            &strings(&["group", "count", "min", "q1", "median", "q3", "max"]),
            &rows,
        );
    } else {
        info!("Group column '{}' not found, skipping grouped summary", args.group_by);
    }

    println!();
    println!("Top {} column(s) correlated with {}", args.top, args.target);
    let mut excluded = args.exclude.clone();
    excluded.push(YEAR_COLUMN.to_string());
    excluded.push(args.group_by.clone());
    let ranking = rank_correlations(&combined, target_idx, &numeric, &excluded);
    let rows = ranking
        .iter()
        .take(args.top)
        .map(|(name, r)| vec![name.clone(), format!("{r:.4}"), format!("{:.4}", r.abs())])
        .collect::<Vec<_>>();
    table::print_table(&strings(&["column", "r", "|r|"]), &rows);

    if let Some(year_idx) = combined.column_index(YEAR_COLUMN) {
        println!();
        println!("Yearly means");
        let rows = yearly_means(&combined, year_idx, &numeric)
            .into_iter()
            .map(|(column, year, mean)| vec![column, year.to_string(), format_metric(mean)])
            .collect::<Vec<_>>();
        table::print_table(&strings(&["column", "year", "mean"]), &rows);
    }
    Ok(())
}

fn load_combined(args: &ProfileArgs) -> Result<Table> {
    let mut combined: Option<Table> = None;
    for input in &args.inputs {
        let delimiter = io_utils::resolve_input_delimiter(input, args.delimiter);
        let table = io_utils::read_table(input, delimiter, UTF_8, DEFAULT_MISSING_MARKERS)
            .with_context(|| format!("Reading {input:?}"))?;
        match combined.as_mut() {
            Some(existing) => existing
                .append(table)
                .with_context(|| format!("Combining {input:?}"))?,
            None => combined = Some(table),
        }
    }
    combined.ok_or_else(|| anyhow!("At least one input file must be provided"))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Columns with at least one value where every present value is numeric.
pub fn numeric_columns(table: &Table) -> Vec<usize> {
    (0..table.column_count())
        .filter(|&idx| {
            let mut present = table.column_cells(idx).filter(|c| !c.is_missing()).peekable();
            present.peek().is_some() && present.all(|c| c.as_number().is_some())
        })
        .collect()
}

fn column_values(table: &Table, idx: usize) -> Vec<f64> {
    table.column_cells(idx).filter_map(|c| c.as_number()).collect()
}

pub struct ColumnStats {
    name: String,
    values: Vec<f64>,
    sum: f64,
    sum_squares: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnStats {
    pub fn from_values(name: &str, values: Vec<f64>) -> Self {
        let mut stats = Self {
            name: name.to_string(),
            values: Vec::with_capacity(values.len()),
            sum: 0.0,
            sum_squares: 0.0,
            min: None,
            max: None,
        };
        for value in values {
            stats.add_value(value);
        }
        stats
    }

    fn add_value(&mut self, value: f64) {
        self.sum += value;
        self.sum_squares += value * value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count() > 0).then(|| self.sum / self.count() as f64)
    }

    pub fn median(&self) -> Option<f64> {
        let sorted = sorted(&self.values);
        quantile(&sorted, 0.5)
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> Option<f64> {
        if self.count() < 2 {
            return None;
        }
        let n = self.count() as f64;
        let mean = self.mean()?;
        let variance = (self.sum_squares - n * mean * mean) / (n - 1.0);
        Some(variance.max(0.0).sqrt())
    }

    fn render_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.count().to_string(),
            self.min.map(format_metric).unwrap_or_default(),
            self.max.map(format_metric).unwrap_or_default(),
            self.mean().map(format_metric).unwrap_or_default(),
            self.median().map(format_metric).unwrap_or_default(),
            self.std_dev().map(format_metric).unwrap_or_default(),
        ]
    }
}

/// Five-number summary of one group's target values.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Distribution {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        Some(Self {
            count: sorted.len(),
            min: *sorted.first()?,
            q1: quantile(&sorted, 0.25)?,
            median: quantile(&sorted, 0.5)?,
            q3: quantile(&sorted, 0.75)?,
            max: *sorted.last()?,
        })
    }

    fn render_row(&self, group: &str) -> Vec<String> {
        vec![
            group.to_string(),
            self.count.to_string(),
            format_metric(self.min),
            format_metric(self.q1),
            format_metric(self.median),
            format_metric(self.q3),
            format_metric(self.max),
        ]
    }
}

/// Target distribution per group value, ordered by group.
pub fn grouped_distribution(
    table: &Table,
    group_idx: usize,
    target_idx: usize,
) -> Vec<(String, Distribution)> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        let group = &row[group_idx];
        if group.is_missing() {
            continue;
        }
        if let Some(value) = row[target_idx].as_number() {
            groups.entry(group.as_display()).or_default().push(value);
        }
    }
    groups
        .into_iter()
        .filter_map(|(group, values)| Distribution::from_values(&values).map(|d| (group, d)))
        .collect()
}

/// Pearson correlation over the rows where both columns are numeric.
pub fn pearson(table: &Table, left: usize, right: usize) -> Option<f64> {
    let pairs = table
        .rows()
        .iter()
        .filter_map(|row| Some((row[left].as_number()?, row[right].as_number()?)))
        .collect::<Vec<_>>();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Numeric columns other than the target and `excluded`, ranked by absolute
/// correlation with the target.
pub fn rank_correlations(
    table: &Table,
    target_idx: usize,
    numeric: &[usize],
    excluded: &[String],
) -> Vec<(String, f64)> {
    numeric
        .iter()
        .filter(|&&idx| idx != target_idx && !excluded.contains(&table.columns()[idx]))
        .filter_map(|&idx| {
            pearson(table, idx, target_idx).map(|r| (table.columns()[idx].clone(), r))
        })
        .sorted_by(|(_, a), (_, b)| b.abs().total_cmp(&a.abs()))
        .collect()
}

/// `(column, year, mean)` for every numeric column except `Year`.
pub fn yearly_means(table: &Table, year_idx: usize, numeric: &[usize]) -> Vec<(String, i64, f64)> {
    let mut means = Vec::new();
    for &idx in numeric.iter().filter(|&&idx| idx != year_idx) {
        let mut by_year: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
        for row in table.rows() {
            if let (Some(year), Some(value)) = (row[year_idx].as_number(), row[idx].as_number()) {
                let entry = by_year.entry(year as i64).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
        for (year, (sum, count)) in by_year {
            means.push((table.columns()[idx].clone(), year, sum / count as f64));
        }
    }
    means
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Linearly interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 {
        format_number(value)
    } else {
        format!("{value:.4}")
    }
}
