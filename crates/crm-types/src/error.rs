//! Base error types shared across the subsystem.

use thiserror::Error;

/// Errors raised by domain type construction and configuration loading.
#[derive(Debug, Error)]
pub enum CrmError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
