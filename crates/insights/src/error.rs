//! Error types for the insights crate
//!
//! Statistical routines never fail on finite input; they return degenerate results instead.
//! The errors below cover the remaining cases: malformed samples handed in by the data
//! layer, invalid configuration, and failures of the concurrent report path.

use thiserror::Error;

/// Result type for insight operations
pub type Result<T> = std::result::Result<T, InsightError>;

/// Errors raised by the insights crate
#[derive(Debug, Error)]
pub enum InsightError {
    /// A sample value is not a finite number
    #[error("invalid sample for {metric} at index {index}: {reason}")]
    InvalidSample {
        metric: String,
        index: usize,
        reason: String,
    },

    /// A timestamp could not be parsed as ISO-8601
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Samples are not in ascending timestamp order
    #[error("series for {metric} is not time-ordered at index {index}")]
    UnorderedSeries { metric: String, index: usize },

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Configuration could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawned analysis task failed to complete
    #[error("analysis task failed: {0}")]
    TaskFailed(String),
}
