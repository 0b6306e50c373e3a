//! Application-wide error types.

use thiserror::Error;

use crate::types::{DateParseError, MoneyError};

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bookkeeping rule violation reported by the ledger engine.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 78,
            Self::Validation(_) | Self::Ledger(_) => 65,
            Self::Io(_) => 74,
            Self::Internal(_) => 70,
        }
    }

    /// Returns a stable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Ledger(_) => "LEDGER_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<MoneyError> for AppError {
    fn from(err: MoneyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<DateParseError> for AppError {
    fn from(err: DateParseError) -> Self {
        Self::Validation(err.to_string())
    }
}
