//! Error types for loading, filtering and exporting.
//!
//! Bad cell values never surface here; they become `None` at the parse
//! boundary. These variants cover the paths that cannot recover.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("Required column '{0}' is missing from the source table")]
    MissingColumn(&'static str),

    #[error("Unsupported source file: {}", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DashboardError>;
