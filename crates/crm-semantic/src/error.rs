//! Error types for the semantic pipeline.

use thiserror::Error;

use crm_embeddings::EmbeddingError;
use crm_store::StoreError;
use crm_vector::VectorError;

/// Errors that can occur in the composite embedding pipeline.
///
/// None of these are fatal to the primary business operation that
/// triggered the pipeline; callers log and move on.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// Context composition failed (e.g., the entity vanished mid-pipeline).
    /// Treated as "no embedding for now".
    #[error("Context composition failed: {0}")]
    Compose(String),

    /// The embedding provider failed in a non-recoverable way
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The backing store rejected a read or write
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Vector adapter failure
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}
