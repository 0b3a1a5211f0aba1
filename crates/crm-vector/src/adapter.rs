//! Vector upsert, delete, and similarity query over the relational store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crm_embeddings::{Embedding, FALLBACK_MODEL_ID};
use crm_store::CrmStore;
use crm_types::{EmbeddingRecord, EntityKind};

use crate::error::VectorError;

/// Characters of source text kept as a result preview.
pub const PREVIEW_CHARS: usize = 200;

/// One ranked similarity result.
#[derive(Debug, Clone)]
pub struct SimilarityMatch {
    /// Kind of the matched entity
    pub kind: EntityKind,

    /// Id of the matched entity
    pub entity_id: String,

    /// Cosine similarity in [-1, 1]
    pub similarity: f32,

    /// Truncated source text of the matched vector
    pub preview: String,

    /// When the matched vector was last written
    pub updated_at: DateTime<Utc>,
}

fn preview_of(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}...")
}

/// A query vector and a stored row are commensurable when their model ids
/// agree or either side is the fallback sentinel. The sentinel exists so
/// degraded rows stay rankable; real-model mismatches are skipped.
fn models_compatible(a: &str, b: &str) -> bool {
    a == b || a == FALLBACK_MODEL_ID || b == FALLBACK_MODEL_ID
}

/// Vector store adapter over a [`CrmStore`].
pub struct VectorStoreAdapter<S: CrmStore> {
    store: Arc<S>,
}

impl<S: CrmStore> VectorStoreAdapter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Write a vector with its source text. Overwrites any existing row for
    /// the same (kind, entity id, field).
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        &self,
        kind: EntityKind,
        entity_id: &str,
        user_id: &str,
        field: &str,
        text: &str,
        embedding: &Embedding,
        model_id: &str,
    ) -> Result<(), VectorError> {
        let record = EmbeddingRecord::new(
            kind,
            entity_id,
            user_id,
            field,
            text,
            embedding.values.clone(),
            model_id,
        )?;
        self.store.upsert_embedding(record).await?;
        Ok(())
    }

    /// Delete vector rows for an entity. `field: None` removes every field.
    /// Idempotent.
    pub async fn delete(
        &self,
        kind: EntityKind,
        entity_id: &str,
        field: Option<&str>,
    ) -> Result<(), VectorError> {
        self.store.delete_embeddings(kind, entity_id, field).await?;
        Ok(())
    }

    /// Rank one user's vectors of `field` in the `kind` collection against
    /// a query vector.
    ///
    /// Results below `threshold` are excluded. Ordering is strictly
    /// descending by similarity; ties break by most-recent update first.
    #[allow(clippy::too_many_arguments)]
    pub async fn query_similar(
        &self,
        kind: EntityKind,
        field: &str,
        query: &Embedding,
        query_model_id: &str,
        threshold: f32,
        limit: usize,
        user_id: &str,
    ) -> Result<Vec<SimilarityMatch>, VectorError> {
        let rows = self.store.embeddings_for_kind(kind, field, user_id).await?;

        let mut matches: Vec<SimilarityMatch> = Vec::new();
        for row in rows {
            if !models_compatible(query_model_id, &row.model_id) {
                debug!(
                    entity_id = %row.entity_id,
                    stored_model = %row.model_id,
                    query_model = %query_model_id,
                    "Skipping vector from incompatible model"
                );
                continue;
            }
            if row.vector.len() != query.dimension() {
                debug!(
                    entity_id = %row.entity_id,
                    stored_dim = row.vector.len(),
                    query_dim = query.dimension(),
                    "Skipping vector with mismatched dimension"
                );
                continue;
            }

            let stored = Embedding::from_normalized(row.vector.clone());
            let similarity = query.cosine_similarity(&stored);
            if similarity < threshold {
                continue;
            }

            matches.push(SimilarityMatch {
                kind,
                entity_id: row.entity_id,
                similarity,
                preview: preview_of(&row.source_text),
                updated_at: row.updated_at,
            });
        }

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        matches.truncate(limit);

        Ok(matches)
    }
}
