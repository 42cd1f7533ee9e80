//! Error types for the clickshare library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for clickshare operations.
#[derive(Debug, Error)]
pub enum ClickshareError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A bound column does not exist in the input table.
    #[error("Column '{column}' not found (available: {})", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// A column expected to be numeric holds a value that cannot be parsed.
    #[error("Non-numeric value '{value}' in column '{column}' at row {row}")]
    TypeMismatch {
        column: String,
        /// 1-based data row (header excluded).
        row: usize,
        value: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid role binding or pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClickshareError {
    /// Build a `ColumnNotFound` error listing the table's headers.
    pub fn column_not_found(column: impl Into<String>, headers: &[String]) -> Self {
        ClickshareError::ColumnNotFound {
            column: column.into(),
            available: headers.to_vec(),
        }
    }
}

/// Result type alias for clickshare operations.
pub type Result<T> = std::result::Result<T, ClickshareError>;
