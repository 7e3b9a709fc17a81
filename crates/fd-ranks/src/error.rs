//! Error types for the ranking pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building rankings.
///
/// Insufficient history, missing prices and zero share counts are not errors:
/// they resolve to null values in the output.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing required column in input data
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Date strings that did not match the expected format
    #[error("{count} date value(s) do not match format {format:?}")]
    InvalidDate {
        /// Number of unparseable values
        count: usize,
        /// Format the values were parsed with
        format: String,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}
