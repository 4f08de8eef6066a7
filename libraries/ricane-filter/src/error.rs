//! Error types for streaming filter sessions

use thiserror::Error;

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while configuring or running a filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Cutoff, order or sample rate rejected at configure time
    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    /// Degenerate coefficient table (zero a0, singular DC denominator, non-finite value)
    #[error("Invalid filter coefficients: {0}")]
    InvalidCoefficients(String),

    /// Filtering or analysis requested before any filter was configured
    #[error("Filter session is not configured")]
    NotConfigured,

    /// Buffer layout does not match the expected channel count
    #[error("Invalid sample buffer: {0}")]
    InvalidBuffer(String),

    /// Settings could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for FilterError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
