//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for itemgate utilities
pub type Result<T> = std::result::Result<T, ItemgateError>;

/// Errors raised by shared utilities (logging setup)
#[derive(Error, Debug)]
pub enum ItemgateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Logging error: {0}")]
    Logging(String),
}

impl ItemgateError {
    /// Build an [`ItemgateError::InvalidValue`] for a named setting
    pub fn invalid_value(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            value: value.into(),
        }
    }
}
