//! Vector adapter error types.

use thiserror::Error;

use crm_store::StoreError;
use crm_types::CrmError;

/// Errors that can occur in the vector store adapter.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Underlying store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Record construction failed validation
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] CrmError),
}
