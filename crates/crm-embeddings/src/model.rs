//! Embedding vector type and provider trait.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Vector embedding - a normalized float array.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector (normalized to unit length)
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding from a vector.
    /// Normalizes the vector to unit length.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = if norm > 0.0 {
            values.iter().map(|x| x / norm).collect()
        } else {
            values
        };
        Self { values: normalized }
    }

    /// Create embedding without normalization (for pre-normalized vectors)
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Compute cosine similarity with another embedding.
    /// Returns value in [-1, 1] range (1 = identical).
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        // Since both are normalized, dot product = cosine similarity
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Result of one embedding call.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// The embedding vector
    pub embedding: Embedding,

    /// Model that produced the vector
    pub model_id: String,

    /// Token usage reported by the provider (0 for fallback vectors)
    pub tokens_used: u32,
}

/// Trait for embedding providers.
///
/// Implementations must be thread-safe (Send + Sync) for concurrent use.
/// The call is synchronous from the caller's point of view: no result
/// exists until the outbound request completes or fails.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier stored alongside produced vectors.
    fn model_id(&self) -> &str;

    /// Vector dimensionality of the model.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    ///
    /// Fails with `InvalidInput` for empty text, `RateLimited` on
    /// throttling, `ProviderUnavailable` on network or auth errors.
    async fn embed(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError>;
}
