//! Deterministic fallback embedder.
//!
//! When the provider is unavailable or throttling, batch contexts
//! substitute a pseudo-random unit vector seeded from the text, tagged with
//! a sentinel model id. Downstream storage and ranking code never has to
//! special-case "no vector"; the system stays degraded-but-functional.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::warn;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingOutput, EmbeddingProvider};

/// Sentinel model id tagged onto fallback vectors.
pub const FALLBACK_MODEL_ID: &str = "deterministic-fallback";

/// Deterministic pseudo-random embedder. Same text, same vector.
pub struct FallbackEmbedder {
    dimension: usize,
}

impl FallbackEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn seed_for(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackEmbedder {
    fn model_id(&self) -> &str {
        FALLBACK_MODEL_ID
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("empty text".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(Self::seed_for(text));
        let values: Vec<f32> = (0..self.dimension)
            .map(|_| rng.random::<f32>() * 2.0 - 1.0)
            .collect();

        Ok(EmbeddingOutput {
            embedding: Embedding::new(values),
            model_id: FALLBACK_MODEL_ID.to_string(),
            tokens_used: 0,
        })
    }
}

/// Degradation policy for batch contexts: try the real provider, and on
/// unavailability or throttling substitute the deterministic fallback.
/// `InvalidInput` propagates - it is never retried or substituted.
pub async fn embed_or_fallback(
    provider: &dyn EmbeddingProvider,
    fallback: &FallbackEmbedder,
    text: &str,
) -> Result<EmbeddingOutput, EmbeddingError> {
    match provider.embed(text).await {
        Ok(output) => Ok(output),
        Err(e @ (EmbeddingError::ProviderUnavailable(_) | EmbeddingError::RateLimited)) => {
            warn!(error = %e, "Provider failed, substituting deterministic fallback vector");
            fallback.embed(text).await
        }
        Err(e) => Err(e),
    }
}
