//! I/O utilities for discovering, reading, and writing cost report CSV files.
//!
//! All file access in the pipeline flows through this module:
//!
//! - **Discovery**: year files are located by matching directory entries
//!   against the configured file-name regex; non-matching files are skipped.
//! - **Encoding**: input bytes are decoded via `encoding_rs`, defaulting to
//!   UTF-8. A leading byte-order mark is stripped.
//! - **Reading**: header labels are made unique (`X`, `X.1`, ...), short rows
//!   are padded with missing cells, and over-long rows are rejected.
//! - **Writing**: output is always UTF-8 with minimal quoting.

use std::{
    collections::HashSet,
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use regex::Regex;

use crate::{
    data::Cell,
    error::PipelineError,
    frame::{Table, YearTable},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Year-tagged input files in `dir`, sorted by file name.
pub fn discover_year_files(dir: &Path, pattern: &Regex) -> Result<Vec<(i32, PathBuf)>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Listing input directory {dir:?}"))?;
    let mut matched = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Listing input directory {dir:?}"))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(captures) = pattern.captures(name) else {
            debug!("Skipping {name:?}: does not match year pattern");
            continue;
        };
        let year = captures
            .get(1)
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .ok_or_else(|| PipelineError::InvalidYear { file: path.clone() })?;
        matched.push((year, path));
    }
    matched.sort_by(|(_, left), (_, right)| left.file_name().cmp(&right.file_name()));
    Ok(matched)
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<BufReader<File>>> {
    let reader =
        BufReader::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?);
    Ok(open_csv_reader(reader, delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    Ok(dedupe_headers(decode_record(&headers, encoding)?))
}

/// Suffixes repeated labels with `.1`, `.2`, ... so every label is unique.
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut unique = Vec::with_capacity(headers.len());
    for header in headers {
        let mut candidate = header.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{header}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

/// Reads a whole delimited file into a [`Table`].
pub fn read_table<S: AsRef<str>>(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    missing_markers: &[S],
) -> Result<Table> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let headers = reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let width = headers.len();

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record =
            record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} in {:?}", row_idx + 2, path))?;
        if decoded.len() > width {
            return Err(PipelineError::RaggedRow {
                path: path.to_path_buf(),
                row: row_idx + 2,
                expected: width,
                found: decoded.len(),
            }
            .into());
        }
        let mut cells = decoded
            .iter()
            .map(|raw| Cell::from_raw(raw, missing_markers))
            .collect::<Vec<_>>();
        cells.resize(width, Cell::Missing);
        rows.push(cells);
    }
    Table::new(headers, rows).with_context(|| format!("Assembling table from {path:?}"))
}

pub fn read_year_table<S: AsRef<str>>(
    year: i32,
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    missing_markers: &[S],
) -> Result<YearTable> {
    let table = read_table(path, delimiter, encoding, missing_markers)?;
    Ok(YearTable {
        year,
        source: path.to_path_buf(),
        table,
    })
}

pub fn open_csv_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = Box::new(BufWriter::new(
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
    ));
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

pub fn write_table(path: &Path, table: &Table, delimiter: u8) -> Result<()> {
    let mut writer = open_csv_writer(path, delimiter)?;
    writer
        .write_record(table.columns())
        .with_context(|| format!("Writing headers to {path:?}"))?;
    for (row_idx, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(Cell::as_display))
            .with_context(|| format!("Writing row {} to {:?}", row_idx + 2, path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing output file {path:?}"))?;
    Ok(())
}
