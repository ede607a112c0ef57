use std::path::PathBuf;

use thiserror::Error;

use crate::model::DayGroup;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type covering the different failure cases that can occur when the
/// pipeline ingests rate sheets or publishes price-list reports.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up while loading or mutating a styled workbook.
    #[error("workbook error: {0}")]
    Workbook(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a workbook lacks a sheet the pipeline requires.
    #[error("missing sheet '{sheet}' in {workbook}")]
    MissingSheet { workbook: PathBuf, sheet: String },

    /// Raised when a source file lacks a structurally required column.
    /// Aborts that file only; other files keep processing.
    #[error("missing required column '{column}' in {file}")]
    MissingColumn { file: PathBuf, column: String },

    /// Raised for unmapped region codes when `strict_regions` is enabled.
    #[error("unknown region code '{0}'")]
    UnknownRegion(String),

    /// Raised when the destination workbook is locked by another program.
    #[error("cannot save '{0}': the file is open elsewhere; close it and rerun")]
    SaveConflict(PathBuf),

    /// Raised when a day-group block holds more records than the template
    /// section can take without spilling into the next one.
    #[error("{group} block overflow: {rows} rows exceed a capacity of {capacity}")]
    BlockOverflow {
        group: DayGroup,
        rows: usize,
        capacity: usize,
    },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
