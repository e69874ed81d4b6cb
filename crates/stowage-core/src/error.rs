//! Error types module
//!
//! Errors raised while naming destinations or interpreting configuration values.
//! Transfer failures live in the transfer crate; these are the ones a caller must
//! resolve before any bytes move.

/// Core error type
#[derive(Debug, thiserror::Error)]
pub enum StowageError {
    /// Malformed naming inputs (empty bucket spec or file identity)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Region string matches neither the canonical nor the legacy form
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// An enumerated configuration value that could not be parsed
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl StowageError {
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        StowageError::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

/// Result type for core operations
pub type StowageResult<T> = Result<T, StowageError>;
