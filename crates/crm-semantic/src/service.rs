//! Composite embedding service: the compose -> embed -> store pipeline and
//! the cross-kind similarity search.
//!
//! Within one generation the embedding call always happens-after
//! composition and always happens-before the store write; the write's input
//! is the embedding's output. Across entities there is no ordering.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crm_embeddings::{embed_or_fallback, EmbeddingProvider, FallbackEmbedder};
use crm_store::CrmStore;
use crm_types::{
    CrmSearchConfig, EmbeddingMetadata, EntityKind, SearchHit, SearchQueryRecord, COMPOSITE_FIELD,
};
use crm_vector::{SimilarityMatch, VectorStoreAdapter};

use crate::compose::compose;
use crate::error::SemanticError;

/// Orchestrates Context Composer -> Embedding Provider -> Vector Store for
/// single entities, and fans a query out across entity collections.
pub struct CompositeEmbeddingService<S: CrmStore> {
    store: Arc<S>,
    vectors: VectorStoreAdapter<S>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    fallback: FallbackEmbedder,
    config: CrmSearchConfig,
}

impl<S: CrmStore> CompositeEmbeddingService<S> {
    /// Create the service. `provider: None` models an unconfigured
    /// deployment: search returns empty results and generation is skipped,
    /// rather than crashing the host application.
    pub fn new(
        store: Arc<S>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        config: CrmSearchConfig,
    ) -> Self {
        let dimension = provider
            .as_ref()
            .map(|p| p.dimension())
            .unwrap_or(config.provider.dimension);
        Self {
            vectors: VectorStoreAdapter::new(store.clone()),
            store,
            provider,
            fallback: FallbackEmbedder::new(dimension),
            config,
        }
    }

    pub fn config(&self) -> &CrmSearchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.store.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Run the full pipeline for one entity's composite vector.
    ///
    /// Empty composition is a skip, not a failure. Provider unavailability
    /// or throttling degrades to the deterministic fallback vector.
    pub async fn generate_composite(
        &self,
        kind: EntityKind,
        entity_id: &str,
        user_id: &str,
    ) -> Result<(), SemanticError> {
        let Some(provider) = &self.provider else {
            debug!(kind = %kind, entity_id = %entity_id, "Provider unconfigured, skipping embedding");
            return Ok(());
        };

        let text = compose(self.store.as_ref(), kind, entity_id).await?;
        if text.trim().is_empty() {
            debug!(kind = %kind, entity_id = %entity_id, "Nothing to embed, skipping");
            return Ok(());
        }

        let output = embed_or_fallback(provider.as_ref(), &self.fallback, &text).await?;

        self.vectors
            .upsert(
                kind,
                entity_id,
                user_id,
                COMPOSITE_FIELD,
                &text,
                &output.embedding,
                &output.model_id,
            )
            .await?;

        self.store
            .put_metadata(EmbeddingMetadata::new(
                kind,
                entity_id,
                user_id,
                COMPOSITE_FIELD,
                &text,
                &output.model_id,
            ))
            .await?;

        debug!(
            kind = %kind,
            entity_id = %entity_id,
            model = %output.model_id,
            tokens = output.tokens_used,
            "Generated composite vector"
        );
        Ok(())
    }

    /// Re-run the pipeline. Full recomputation is the only update strategy;
    /// there is no patch path.
    pub async fn update_composite(
        &self,
        kind: EntityKind,
        entity_id: &str,
        user_id: &str,
    ) -> Result<(), SemanticError> {
        self.generate_composite(kind, entity_id, user_id).await
    }

    /// Embed one designated free-text field of an entity.
    ///
    /// Unknown or empty fields are a skip, not a failure.
    pub async fn generate_field(
        &self,
        kind: EntityKind,
        entity_id: &str,
        field: &str,
        user_id: &str,
    ) -> Result<(), SemanticError> {
        let Some(provider) = &self.provider else {
            debug!(kind = %kind, entity_id = %entity_id, "Provider unconfigured, skipping embedding");
            return Ok(());
        };

        let text = match self.field_text(kind, entity_id, field).await? {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                debug!(kind = %kind, entity_id = %entity_id, field = %field, "No field text, skipping");
                return Ok(());
            }
        };

        let output = embed_or_fallback(provider.as_ref(), &self.fallback, &text).await?;

        self.vectors
            .upsert(kind, entity_id, user_id, field, &text, &output.embedding, &output.model_id)
            .await?;

        self.store
            .put_metadata(EmbeddingMetadata::new(
                kind, entity_id, user_id, field, &text, &output.model_id,
            ))
            .await?;

        Ok(())
    }

    async fn field_text(
        &self,
        kind: EntityKind,
        entity_id: &str,
        field: &str,
    ) -> Result<Option<String>, SemanticError> {
        let text = match (kind, field) {
            (EntityKind::Contact, "persona") => self
                .store
                .get_contact(entity_id)
                .await?
                .and_then(|c| c.persona),
            (EntityKind::Contact, "notes") => self
                .store
                .get_contact(entity_id)
                .await?
                .and_then(|c| c.notes),
            (EntityKind::Deal, "next_step") => self
                .store
                .get_deal(entity_id)
                .await?
                .and_then(|d| d.next_step),
            _ => None,
        };
        Ok(text)
    }

    /// Remove every vector and metadata row for an entity. Idempotent.
    /// Invoked from the host's entity-deletion path.
    pub async fn delete_composite(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<(), SemanticError> {
        self.vectors.delete(kind, entity_id, None).await?;
        self.store.delete_metadata(kind, entity_id).await?;
        debug!(kind = %kind, entity_id = %entity_id, "Deleted vectors and metadata");
        Ok(())
    }

    /// Cross-kind semantic search over composite vectors.
    ///
    /// Embeds the query once, queries each requested kind, merges, sorts by
    /// similarity descending, truncates to `limit`. One kind's query
    /// failure is logged and skipped; callers get best-effort results.
    pub async fn search_composite(
        &self,
        query: &str,
        target: Option<EntityKind>,
        threshold: Option<f32>,
        limit: Option<usize>,
        user_id: &str,
    ) -> Result<Vec<SimilarityMatch>, SemanticError> {
        let Some(provider) = &self.provider else {
            info!("Provider unconfigured, semantic search returns no results");
            return Ok(Vec::new());
        };

        let threshold = threshold.unwrap_or(self.config.search.default_threshold);
        let limit = limit.unwrap_or(self.config.search.default_limit);

        let output = provider.embed(query).await?;

        let kinds: Vec<EntityKind> = match target {
            Some(kind) => vec![kind],
            None => EntityKind::ALL.to_vec(),
        };

        let mut merged: Vec<SimilarityMatch> = Vec::new();
        for kind in kinds {
            match self
                .vectors
                .query_similar(
                    kind,
                    COMPOSITE_FIELD,
                    &output.embedding,
                    &output.model_id,
                    threshold,
                    limit,
                    user_id,
                )
                .await
            {
                Ok(matches) => merged.extend(matches),
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Similarity query failed, continuing with other kinds");
                }
            }
        }

        merged.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        merged.truncate(limit);

        let hits: Vec<SearchHit> = merged
            .iter()
            .map(|m| SearchHit {
                kind: m.kind,
                entity_id: m.entity_id.clone(),
                similarity: m.similarity,
            })
            .collect();
        let record = SearchQueryRecord::new(
            user_id,
            query,
            output.embedding.values.clone(),
            target,
            threshold,
            hits,
        );
        if let Err(e) = self.store.record_search(record).await {
            warn!(error = %e, "Failed to record search query");
        }

        Ok(merged)
    }
}
