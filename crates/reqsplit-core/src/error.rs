//! Unified error types for reqsplit

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all reqsplit library operations
#[derive(Error, Debug)]
pub enum ReqError {
    // Input file errors
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid input file {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Spreadsheet errors
    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Column header not found: {0}")]
    HeaderNotFound(String),

    #[error("Row {row} out of range (1-{max_row})")]
    RowOutOfRange { row: u32, max_row: u32 },

    // Metrics errors
    #[error("No aligned rows between predictions and references")]
    NoAlignedRows,

    #[error("Metrics error: {0}")]
    Metrics(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using ReqError
pub type Result<T> = std::result::Result<T, ReqError>;
