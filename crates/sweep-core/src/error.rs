//! Error types for sweep-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sweep-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse CSV
    #[error("failed to parse CSV '{source_name}': {message}")]
    CsvParse {
        source_name: String,
        message: String,
    },

    /// CSV error from the csv crate
    #[error("CSV error in '{source_name}': {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// No tables were supplied
    #[error("no input tables: please upload CSV file(s)")]
    NoInput,

    /// Tables could not be combined into one
    #[error("column mismatch in table {table}: {detail}")]
    ColumnMismatch { table: usize, detail: String },

    /// Text could not be converted to or from bytes
    #[error("{encoding} encoding error: {message}")]
    Encoding {
        encoding: &'static str,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the user can fix this by changing merge options and retrying
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Error::ColumnMismatch { .. } | Error::NoInput)
    }
}
