//! In-memory `CrmStore` implementation.
//!
//! Backs the test suite and small single-process deployments. All state
//! lives behind one `RwLock`; per-call locking gives the same per-row
//! consistency the external store would.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crm_types::{
    Activity, Contact, Deal, EmbeddingMetadata, EmbeddingRecord, EntityKind, Lead,
    SearchQueryRecord, COMPOSITE_FIELD,
};

use crate::error::StoreError;
use crate::store::CrmStore;

type VectorKey = (EntityKind, String, String);

#[derive(Default)]
struct Inner {
    deals: HashMap<String, Deal>,
    contacts: HashMap<String, Contact>,
    leads: HashMap<String, Lead>,
    activities: HashMap<String, Activity>,
    embeddings: HashMap<VectorKey, EmbeddingRecord>,
    metadata: HashMap<String, EmbeddingMetadata>,
    searches: Vec<SearchQueryRecord>,
}

/// In-memory relational store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Recorded searches for a user, oldest first. Test/analytics accessor.
    pub fn searches_for_user(&self, user_id: &str) -> Result<Vec<SearchQueryRecord>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .searches
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}

fn most_recent_first(mut activities: Vec<Activity>) -> Vec<Activity> {
    activities.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    activities
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn insert_deal(&self, deal: Deal) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.deals.contains_key(&deal.id) {
            return Err(StoreError::WriteFailed(format!(
                "deal {} already exists",
                deal.id
            )));
        }
        inner.deals.insert(deal.id.clone(), deal);
        Ok(())
    }

    async fn get_deal(&self, id: &str) -> Result<Option<Deal>, StoreError> {
        Ok(self.read()?.deals.get(id).cloned())
    }

    async fn update_deal(&self, deal: Deal) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.deals.contains_key(&deal.id) {
            return Err(StoreError::NotFound(format!("deal {}", deal.id)));
        }
        inner.deals.insert(deal.id.clone(), deal);
        Ok(())
    }

    async fn deals_for_user(&self, user_id: &str) -> Result<Vec<Deal>, StoreError> {
        let inner = self.read()?;
        let mut deals: Vec<Deal> = inner
            .deals
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        deals.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(deals)
    }

    async fn insert_contact(&self, contact: Contact) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.contacts.contains_key(&contact.id) {
            return Err(StoreError::WriteFailed(format!(
                "contact {} already exists",
                contact.id
            )));
        }
        inner.contacts.insert(contact.id.clone(), contact);
        Ok(())
    }

    async fn get_contact(&self, id: &str) -> Result<Option<Contact>, StoreError> {
        Ok(self.read()?.contacts.get(id).cloned())
    }

    async fn update_contact(&self, contact: Contact) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.contacts.contains_key(&contact.id) {
            return Err(StoreError::NotFound(format!("contact {}", contact.id)));
        }
        inner.contacts.insert(contact.id.clone(), contact);
        Ok(())
    }

    async fn contacts_for_user(&self, user_id: &str) -> Result<Vec<Contact>, StoreError> {
        let inner = self.read()?;
        let mut contacts: Vec<Contact> = inner
            .contacts
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(contacts)
    }

    async fn insert_lead(&self, lead: Lead) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.leads.contains_key(&lead.id) {
            return Err(StoreError::WriteFailed(format!(
                "lead {} already exists",
                lead.id
            )));
        }
        inner.leads.insert(lead.id.clone(), lead);
        Ok(())
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StoreError> {
        Ok(self.read()?.leads.get(id).cloned())
    }

    async fn update_lead(&self, lead: Lead) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.leads.contains_key(&lead.id) {
            return Err(StoreError::NotFound(format!("lead {}", lead.id)));
        }
        inner.leads.insert(lead.id.clone(), lead);
        Ok(())
    }

    async fn leads_for_user(&self, user_id: &str) -> Result<Vec<Lead>, StoreError> {
        let inner = self.read()?;
        let mut leads: Vec<Lead> = inner
            .leads
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        leads.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(leads)
    }

    async fn delete_entity(&self, kind: EntityKind, id: &str) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let existed = match kind {
            EntityKind::Deal => inner.deals.remove(id).is_some(),
            EntityKind::Contact => inner.contacts.remove(id).is_some(),
            EntityKind::Lead => inner.leads.remove(id).is_some(),
        };

        // Cascade: no orphaned vector or metadata rows may remain.
        inner
            .embeddings
            .retain(|(k, eid, _), _| !(*k == kind && eid == id));
        inner
            .metadata
            .retain(|_, m| !(m.kind == kind && m.entity_id == id));

        debug!(kind = %kind, entity_id = %id, existed, "Deleted entity with cascade");
        Ok(())
    }

    async fn insert_activity(&self, activity: Activity) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.activities.contains_key(&activity.id) {
            return Err(StoreError::WriteFailed(format!(
                "activity {} already exists",
                activity.id
            )));
        }
        inner.activities.insert(activity.id.clone(), activity);
        Ok(())
    }

    async fn delete_activity(&self, id: &str) -> Result<(), StoreError> {
        self.write()?.activities.remove(id);
        Ok(())
    }

    async fn activities_for_deal(&self, deal_id: &str) -> Result<Vec<Activity>, StoreError> {
        let inner = self.read()?;
        let matched = inner
            .activities
            .values()
            .filter(|a| a.deal_id.as_deref() == Some(deal_id))
            .cloned()
            .collect();
        Ok(most_recent_first(matched))
    }

    async fn activities_for_contact(&self, contact_id: &str) -> Result<Vec<Activity>, StoreError> {
        let inner = self.read()?;
        let matched = inner
            .activities
            .values()
            .filter(|a| a.contact_id.as_deref() == Some(contact_id))
            .cloned()
            .collect();
        Ok(most_recent_first(matched))
    }

    async fn activities_for_lead(&self, lead_id: &str) -> Result<Vec<Activity>, StoreError> {
        let inner = self.read()?;
        let matched = inner
            .activities
            .values()
            .filter(|a| a.lead_id.as_deref() == Some(lead_id))
            .cloned()
            .collect();
        Ok(most_recent_first(matched))
    }

    async fn deals_for_contact(&self, contact_id: &str) -> Result<Vec<Deal>, StoreError> {
        let inner = self.read()?;
        let mut deals: Vec<Deal> = inner
            .deals
            .values()
            .filter(|d| d.contact_id.as_deref() == Some(contact_id))
            .cloned()
            .collect();
        deals.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        Ok(deals)
    }

    async fn upsert_embedding(&self, mut record: EmbeddingRecord) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let key = record.key();
        if let Some(existing) = inner.embeddings.get(&key) {
            record.created_at = existing.created_at;
        }
        debug!(
            kind = %record.kind,
            entity_id = %record.entity_id,
            field = %record.field,
            "Upserted embedding row"
        );
        inner.embeddings.insert(key, record);
        Ok(())
    }

    async fn get_embedding(
        &self,
        kind: EntityKind,
        entity_id: &str,
        field: &str,
    ) -> Result<Option<EmbeddingRecord>, StoreError> {
        let key = (kind, entity_id.to_string(), field.to_string());
        Ok(self.read()?.embeddings.get(&key).cloned())
    }

    async fn delete_embeddings(
        &self,
        kind: EntityKind,
        entity_id: &str,
        field: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.embeddings.retain(|(k, eid, f), _| {
            !(*k == kind && eid == entity_id && field.map(|want| f == want).unwrap_or(true))
        });
        Ok(())
    }

    async fn embeddings_for_kind(
        &self,
        kind: EntityKind,
        field: &str,
        user_id: &str,
    ) -> Result<Vec<EmbeddingRecord>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .embeddings
            .values()
            .filter(|r| r.kind == kind && r.field == field && r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn put_metadata(&self, metadata: EmbeddingMetadata) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        // One row per (kind, entity id, field)
        inner.metadata.retain(|_, m| {
            !(m.kind == metadata.kind
                && m.entity_id == metadata.entity_id
                && m.field == metadata.field)
        });
        inner.metadata.insert(metadata.id.clone(), metadata);
        Ok(())
    }

    async fn delete_metadata(&self, kind: EntityKind, entity_id: &str) -> Result<(), StoreError> {
        self.write()?
            .metadata
            .retain(|_, m| !(m.kind == kind && m.entity_id == entity_id));
        Ok(())
    }

    async fn metadata_for_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<EmbeddingMetadata>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .metadata
            .values()
            .filter(|m| m.kind == kind && m.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn record_search(&self, record: SearchQueryRecord) -> Result<(), StoreError> {
        self.write()?.searches.push(record);
        Ok(())
    }

    async fn entities_missing_composite(
        &self,
        kind: EntityKind,
        user_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.read()?;
        let ids: Vec<String> = match kind {
            EntityKind::Deal => inner
                .deals
                .values()
                .filter(|d| d.user_id == user_id)
                .map(|d| d.id.clone())
                .collect(),
            EntityKind::Contact => inner
                .contacts
                .values()
                .filter(|c| c.user_id == user_id)
                .map(|c| c.id.clone())
                .collect(),
            EntityKind::Lead => inner
                .leads
                .values()
                .filter(|l| l.user_id == user_id)
                .map(|l| l.id.clone())
                .collect(),
        };

        let mut missing: Vec<String> = ids
            .into_iter()
            .filter(|id| {
                !inner
                    .embeddings
                    .contains_key(&(kind, id.clone(), COMPOSITE_FIELD.to_string()))
            })
            .collect();
        missing.sort();
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crm_types::ActivityKind;

    fn deal(id: &str, user: &str) -> Deal {
        Deal::new(id, user, format!("Deal {id}"), "Prospecting").unwrap()
    }

    fn record(kind: EntityKind, id: &str, field: &str) -> EmbeddingRecord {
        EmbeddingRecord::new(kind, id, "user-1", field, "text", vec![1.0, 0.0], "model-a").unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_deal() {
        let store = MemoryStore::new();
        store.insert_deal(deal("deal-1", "user-1")).await.unwrap();

        let fetched = store.get_deal("deal-1").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Deal deal-1");

        // Duplicate insert is rejected
        assert!(store.insert_deal(deal("deal-1", "user-1")).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_deal_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_deal(deal("deal-9", "user-1")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_activities_most_recent_first() {
        let store = MemoryStore::new();
        let base = Utc::now();
        for (i, offset) in [(1, 0i64), (2, 60), (3, 30)] {
            let mut activity =
                Activity::new(format!("act-{i}"), "user-1", ActivityKind::Note, "note")
                    .unwrap()
                    .with_deal("deal-1");
            activity.created_at = base + Duration::seconds(offset);
            store.insert_activity(activity).await.unwrap();
        }

        let activities = store.activities_for_deal("deal-1").await.unwrap();
        let ids: Vec<&str> = activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["act-2", "act-3", "act-1"]);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_keeping_created_at() {
        let store = MemoryStore::new();
        let first = record(EntityKind::Deal, "deal-1", COMPOSITE_FIELD);
        let original_created = first.created_at;
        store.upsert_embedding(first).await.unwrap();

        let mut second = record(EntityKind::Deal, "deal-1", COMPOSITE_FIELD);
        second.vector = vec![0.0, 1.0];
        store.upsert_embedding(second).await.unwrap();

        let stored = store
            .get_embedding(EntityKind::Deal, "deal-1", COMPOSITE_FIELD)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.vector, vec![0.0, 1.0]);
        assert_eq!(stored.created_at, original_created);
    }

    #[tokio::test]
    async fn test_delete_entity_cascades() {
        let store = MemoryStore::new();
        store.insert_deal(deal("deal-1", "user-1")).await.unwrap();
        store
            .upsert_embedding(record(EntityKind::Deal, "deal-1", COMPOSITE_FIELD))
            .await
            .unwrap();
        store
            .upsert_embedding(record(EntityKind::Deal, "deal-1", "notes"))
            .await
            .unwrap();
        store
            .put_metadata(EmbeddingMetadata::new(
                EntityKind::Deal,
                "deal-1",
                "user-1",
                COMPOSITE_FIELD,
                "text",
                "model-a",
            ))
            .await
            .unwrap();

        store.delete_entity(EntityKind::Deal, "deal-1").await.unwrap();

        assert!(store.get_deal("deal-1").await.unwrap().is_none());
        assert!(store
            .get_embedding(EntityKind::Deal, "deal-1", COMPOSITE_FIELD)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_embedding(EntityKind::Deal, "deal-1", "notes")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .metadata_for_entity(EntityKind::Deal, "deal-1")
            .await
            .unwrap()
            .is_empty());

        // Deleting twice is a no-op, not an error
        store.delete_entity(EntityKind::Deal, "deal-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_embeddings_single_field() {
        let store = MemoryStore::new();
        store
            .upsert_embedding(record(EntityKind::Contact, "contact-1", COMPOSITE_FIELD))
            .await
            .unwrap();
        store
            .upsert_embedding(record(EntityKind::Contact, "contact-1", "persona"))
            .await
            .unwrap();

        store
            .delete_embeddings(EntityKind::Contact, "contact-1", Some("persona"))
            .await
            .unwrap();

        assert!(store
            .get_embedding(EntityKind::Contact, "contact-1", "persona")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_embedding(EntityKind::Contact, "contact-1", COMPOSITE_FIELD)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_entities_missing_composite() {
        let store = MemoryStore::new();
        for i in 1..=3 {
            store
                .insert_deal(deal(&format!("deal-{i}"), "user-1"))
                .await
                .unwrap();
        }
        // Other user's deal must not appear
        store.insert_deal(deal("deal-9", "user-2")).await.unwrap();

        store
            .upsert_embedding(record(EntityKind::Deal, "deal-2", COMPOSITE_FIELD))
            .await
            .unwrap();

        let missing = store
            .entities_missing_composite(EntityKind::Deal, "user-1")
            .await
            .unwrap();
        assert_eq!(missing, vec!["deal-1".to_string(), "deal-3".to_string()]);
    }
}
