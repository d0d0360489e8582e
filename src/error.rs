//! Error types for dataset loading, aggregation and rendering.
//!
//! Every variant is terminal for the current run: nothing is retried and
//! no partial workbook is left behind on purpose.

use thiserror::Error;

/// Errors produced by the pay-equity pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The input is missing one or more required columns.
    #[error("Missing required columns: {}.", .missing.join(", "))]
    Schema {
        /// Missing column names, sorted.
        missing: Vec<String>,
    },

    /// The input file has neither a CSV nor an Excel extension.
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    /// The input file exists but could not be read or parsed.
    #[error("Failed to read input: {0}")]
    Input(String),

    /// The workbook could not be built or written.
    #[error("Failed to render report: {0}")]
    Render(String),
}

impl ReportError {
    /// Build a schema error from an unsorted list of missing columns.
    pub fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut missing: Vec<String> = missing.into_iter().map(Into::into).collect();
        missing.sort();
        missing.dedup();
        ReportError::Schema { missing }
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Input(e.to_string())
    }
}

impl From<calamine::XlsxError> for ReportError {
    fn from(e: calamine::XlsxError) -> Self {
        ReportError::Input(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ReportError::Render(e.to_string())
    }
}

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, ReportError>;
