//! Fatal error conditions raised by the cleaning pipeline.
//!
//! Soft conditions (a target variable that cannot be resolved in one year, a
//! categorical value outside the accepted codes) never surface here; they are
//! recorded in the per-year [`LogRecord`](crate::cleaner::LogRecord) instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No file in the input directory matched the year pattern.
    #[error("No input files matching '{pattern}' found in {dir:?}")]
    NoInputFiles { dir: PathBuf, pattern: String },

    #[error("Cannot reconcile an empty set of cleaned tables")]
    EmptyReconciliation,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File name {file:?} does not carry a valid four-digit year")]
    InvalidYear { file: PathBuf },

    #[error("Row {row} in {path:?} has {found} field(s) but the header declares {expected}")]
    RaggedRow {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },
}
