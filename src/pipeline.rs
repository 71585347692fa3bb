//! End-to-end cleaning run over a directory of yearly cost report files.
//!
//! Every input is read and cleaned before anything is written, so a failure
//! at any point leaves the output directory untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use log::info;
use serde::Serialize;

use crate::{
    cleaner::{self, CleaningRules, LogRecord, TargetResolution},
    cli::CleanArgs,
    config::PipelineConfig,
    error::PipelineError,
    io_utils, reconcile, table,
    window::{self, WrittenWindow},
};

/// Reader/writer settings that are not part of the cleaning rules.
#[derive(Debug, Clone, Copy)]
pub struct IoOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct YearResolutions {
    pub year: i32,
    pub targets: Vec<TargetResolution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub common_columns: Vec<String>,
    pub windows: Vec<WrittenWindow>,
    pub log_path: PathBuf,
    pub logs: Vec<LogRecord>,
    pub resolutions: Vec<YearResolutions>,
}

pub fn run_pipeline(
    input_dir: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
    io: IoOptions,
) -> Result<PipelineReport> {
    config.validate()?;
    let pattern = config.year_regex()?;

    let files = io_utils::discover_year_files(input_dir, &pattern)?;
    if files.is_empty() {
        return Err(PipelineError::NoInputFiles {
            dir: input_dir.to_path_buf(),
            pattern: config.file_pattern.clone(),
        }
        .into());
    }
    info!("Found {} yearly file(s) in {:?}", files.len(), input_dir);

    let rules = CleaningRules::from(config);
    let mut cleaned = Vec::with_capacity(files.len());
    let mut logs = Vec::with_capacity(files.len());
    let mut resolutions = Vec::with_capacity(files.len());
    for (year, path) in &files {
        let raw = io_utils::read_year_table(
            *year,
            path,
            io.delimiter,
            io.encoding,
            &config.missing_markers,
        )
        .with_context(|| format!("Reading {path:?}"))?;
        let outcome = cleaner::clean_year(&raw, &rules);
        resolutions.push(YearResolutions {
            year: *year,
            targets: outcome.resolutions,
        });
        logs.push(outcome.log);
        cleaned.push(outcome.cleaned);
    }
    logs.sort_by_key(|record| record.year);

    let reconciled = reconcile::reconcile(&cleaned)?;
    info!(
        "Common schema across {} year(s): {} column(s)",
        reconciled.tables.len(),
        reconciled.common_columns.len()
    );
    let combined = reconciled.combine()?;
    let partitions = window::split_windows(&combined, &config.windows)?;

    let windows = window::write_partitions(output_dir, &partitions, io.delimiter)?;
    let log_path = output_dir.join(&config.log_file_name);
    window::write_log(&log_path, &logs, io.delimiter)?;

    Ok(PipelineReport {
        common_columns: reconciled.common_columns,
        windows,
        log_path,
        logs,
        resolutions,
    })
}

pub fn execute(args: &CleanArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.missing_threshold = threshold;
    }
    let io = IoOptions {
        delimiter: args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    let output_dir = args.output_dir.as_deref().unwrap_or(&args.input_dir);
    info!(
        "Cleaning '{}' -> '{}' (delimiter '{}')",
        args.input_dir.display(),
        output_dir.display(),
        crate::printable_delimiter(io.delimiter)
    );

    let report = run_pipeline(&args.input_dir, output_dir, &config, io)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_summary(&report));
    }
    Ok(())
}

pub fn render_summary(report: &PipelineReport) -> String {
    let headers = ["window", "years", "rows", "columns", "path"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = report
        .windows
        .iter()
        .map(|w| {
            vec![
                w.name.clone(),
                format!("{}-{}", w.start, w.end),
                w.rows.to_string(),
                w.columns.to_string(),
                w.path.display().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let mut rendered = table::render_table(&headers, &rows);
    rendered.push_str(&format!("log: {}\n", report.log_path.display()));
    rendered
}
