//! Store error types.

use thiserror::Error;

/// Errors that can occur at the relational store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store rejected a write
    #[error("Store write failed: {0}")]
    WriteFailed(String),

    /// Internal lock failure
    #[error("Lock error: {0}")]
    Lock(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}
