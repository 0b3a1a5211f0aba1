//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Network or auth failure calling the provider. Recoverable: batch
    /// contexts substitute the deterministic fallback vector.
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider signalled throttling (HTTP 429).
    #[error("Embedding provider rate limited")]
    RateLimited,

    /// Empty or malformed input text. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client construction or configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
