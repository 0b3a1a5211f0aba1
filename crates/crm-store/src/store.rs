//! The `CrmStore` trait: everything the embedding pipeline needs from the
//! relational store.
//!
//! Implementations must be thread-safe (Send + Sync); concurrent pipelines
//! never share in-process mutable state, so the store's own write
//! serialization is the only consistency mechanism relied upon.

use async_trait::async_trait;

use crm_types::{
    Activity, Contact, Deal, EmbeddingMetadata, EmbeddingRecord, EntityKind, Lead,
    SearchQueryRecord,
};

use crate::error::StoreError;

#[async_trait]
pub trait CrmStore: Send + Sync {
    // --- Deals ---

    async fn insert_deal(&self, deal: Deal) -> Result<(), StoreError>;
    async fn get_deal(&self, id: &str) -> Result<Option<Deal>, StoreError>;
    async fn update_deal(&self, deal: Deal) -> Result<(), StoreError>;
    async fn deals_for_user(&self, user_id: &str) -> Result<Vec<Deal>, StoreError>;

    // --- Contacts ---

    async fn insert_contact(&self, contact: Contact) -> Result<(), StoreError>;
    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, StoreError>;
    async fn update_contact(&self, contact: Contact) -> Result<(), StoreError>;
    async fn contacts_for_user(&self, user_id: &str) -> Result<Vec<Contact>, StoreError>;

    // --- Leads ---

    async fn insert_lead(&self, lead: Lead) -> Result<(), StoreError>;
    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StoreError>;
    async fn update_lead(&self, lead: Lead) -> Result<(), StoreError>;
    async fn leads_for_user(&self, user_id: &str) -> Result<Vec<Lead>, StoreError>;

    /// Delete an entity and cascade to its vector and metadata rows.
    /// Idempotent: deleting an absent entity is a no-op.
    async fn delete_entity(&self, kind: EntityKind, id: &str) -> Result<(), StoreError>;

    // --- Activities ---

    async fn insert_activity(&self, activity: Activity) -> Result<(), StoreError>;
    async fn delete_activity(&self, id: &str) -> Result<(), StoreError>;

    /// Activities linked to a deal, most recent first.
    async fn activities_for_deal(&self, deal_id: &str) -> Result<Vec<Activity>, StoreError>;

    /// Activities linked to a contact, most recent first.
    async fn activities_for_contact(&self, contact_id: &str) -> Result<Vec<Activity>, StoreError>;

    /// Activities linked to a lead, most recent first.
    async fn activities_for_lead(&self, lead_id: &str) -> Result<Vec<Activity>, StoreError>;

    /// Deals linked to a contact, most recent first.
    async fn deals_for_contact(&self, contact_id: &str) -> Result<Vec<Deal>, StoreError>;

    // --- Vector rows ---

    /// Write a vector row. At most one row exists per (kind, entity id,
    /// field): an existing row is overwritten, keeping its created_at.
    async fn upsert_embedding(&self, record: EmbeddingRecord) -> Result<(), StoreError>;

    async fn get_embedding(
        &self,
        kind: EntityKind,
        entity_id: &str,
        field: &str,
    ) -> Result<Option<EmbeddingRecord>, StoreError>;

    /// Delete vector rows for an entity. `field: None` deletes every field.
    /// Idempotent.
    async fn delete_embeddings(
        &self,
        kind: EntityKind,
        entity_id: &str,
        field: Option<&str>,
    ) -> Result<(), StoreError>;

    /// All vector rows of one field for one user's entities of a kind.
    async fn embeddings_for_kind(
        &self,
        kind: EntityKind,
        field: &str,
        user_id: &str,
    ) -> Result<Vec<EmbeddingRecord>, StoreError>;

    // --- Audit metadata ---

    /// Write an audit metadata row. Rows are keyed by (kind, entity id,
    /// field): an existing row for the same key is replaced.
    async fn put_metadata(&self, metadata: EmbeddingMetadata) -> Result<(), StoreError>;

    /// Delete all metadata rows scoped to an entity. Idempotent.
    async fn delete_metadata(&self, kind: EntityKind, entity_id: &str) -> Result<(), StoreError>;

    async fn metadata_for_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<EmbeddingMetadata>, StoreError>;

    /// Record a search query for analytics and reproducibility.
    async fn record_search(&self, record: SearchQueryRecord) -> Result<(), StoreError>;

    // --- Backfill ---

    /// Ids of entities of `kind` owned by `user_id` that have no composite
    /// vector row. Ordered by id for deterministic batching.
    async fn entities_missing_composite(
        &self,
        kind: EntityKind,
        user_id: &str,
    ) -> Result<Vec<String>, StoreError>;
}
