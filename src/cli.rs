use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean and reconcile yearly SNF cost report CSV files",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean every yearly file in a directory and write the windowed outputs
    Clean(CleanArgs),
    /// Show how target and drop-list names resolve against one file's header
    Resolve(ResolveArgs),
    /// Print descriptive statistics for cleaned output files
    Profile(ProfileArgs),
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Directory holding the SNF_CostReport_<year>.csv files
    pub input_dir: PathBuf,
    /// YAML file overriding the built-in cleaning rules
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory for the outputs (defaults to the input directory)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Drop columns whose missing share is at or above this fraction
    #[arg(long)]
    pub threshold: Option<f64>,
    /// CSV delimiter character for inputs and outputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print the run report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Yearly input file whose header should be inspected
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML file overriding the built-in cleaning rules
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Cleaned CSV files to profile together
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Column the correlations and group summary are computed against
    #[arg(long, default_value = "Net Income")]
    pub target: String,
    /// Categorical column used to group the target summary
    #[arg(long = "group-by", default_value = "Rural versus Urban")]
    pub group_by: String,
    /// Columns left out of the correlation ranking
    #[arg(long = "exclude", action = clap::ArgAction::Append, default_value = "Provider CCN")]
    pub exclude: Vec<String>,
    /// Number of most correlated columns to list
    #[arg(long, default_value_t = 5)]
    pub top: usize,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
