pub mod cleaner;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod io_utils;
pub mod pipeline;
pub mod profile;
pub mod reconcile;
pub mod table;
pub mod window;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    columns::ColumnMap,
    config::PipelineConfig,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("snf_costreport", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => pipeline::execute(&args),
        Commands::Resolve(args) => handle_resolve(&args),
        Commands::Profile(args) => profile::execute(&args),
    }
}

fn handle_resolve(args: &cli::ResolveArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Resolving names against '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {:?}", args.input))?;
    let colmap = ColumnMap::build(&headers);

    let rows = audit_rows(&colmap, &config.targets, &config.drop);

    let headers = ["role", "name", "column", "match"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    info!(
        "Resolved {} of {} target(s) across {} column(s)",
        rows.iter().filter(|r| r[0] == "target" && !r[2].is_empty()).count(),
        config.targets.len(),
        colmap.len()
    );
    Ok(())
}

/// One `role, name, column, match` row per target and per drop-listed label.
///
/// Targets resolve only against labels that survive the drop list, the same
/// set `clean` searches. Columns `clean` would also drop for missingness are
/// not known from the header and are not excluded here.
fn audit_rows(colmap: &ColumnMap, targets: &[String], drop: &[String]) -> Vec<Vec<String>> {
    let dropped = colmap.resolve_drop_set(drop);
    let target_rows = targets.iter().map(|target| {
        match colmap.resolve_where(target, |label| !dropped.iter().any(|d| d == label)) {
            Some(resolution) => vec![
                "target".to_string(),
                target.clone(),
                resolution.label,
                resolution.kind.to_string(),
            ],
            None => vec![
                "target".to_string(),
                target.clone(),
                String::new(),
                "missing".to_string(),
            ],
        }
    });
    let drop_rows = dropped
        .iter()
        .map(|label| vec!["drop".to_string(), label.clone(), label.clone(), "exact".to_string()]);
    target_rows.chain(drop_rows).collect()
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
