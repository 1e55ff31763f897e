//! Error handling for regional ETL operations.
//!
//! Provides error types carrying the offending file, column or parameter
//! so callers can tell a schema mismatch from a broken source file.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Configuration file could not be parsed: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Source not found at path: {path}")]
    NotFound { path: PathBuf },

    #[error("Column '{column}' is missing from {table}")]
    MissingColumn { column: String, table: String },

    #[error("Format mismatch: {reason}")]
    FormatMismatch { reason: String },

    #[error("Empty result: {reason}")]
    EmptyResult { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EtlError {
    pub fn missing_column(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            table: table.into(),
        }
    }

    pub fn format_mismatch(reason: impl Into<String>) -> Self {
        Self::FormatMismatch {
            reason: reason.into(),
        }
    }

    pub fn empty_result(reason: impl Into<String>) -> Self {
        Self::EmptyResult {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
