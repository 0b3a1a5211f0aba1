//! Context composition: render an entity and its relational neighborhood
//! into one bounded text blob prior to embedding.
//!
//! Pure given current store state: same inputs, same output, safe to
//! retry. Returns an empty string (never an error) when the entity has no
//! describable content; callers treat empty as "skip embedding".

use crm_store::CrmStore;
use crm_types::{Activity, EntityKind};

use crate::error::SemanticError;

/// Most-recent activities included per entity.
pub const MAX_ACTIVITY_EXCERPTS: usize = 5;

/// Characters kept from each activity body.
pub const ACTIVITY_EXCERPT_CHARS: usize = 200;

/// Related deals included when composing a contact.
pub const MAX_RELATED_DEALS: usize = 3;

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

fn render_activity(activity: &Activity) -> String {
    let mut line = format!("[{}] {}", activity.kind, activity.subject.trim());
    if let Some(content) = &activity.content {
        let content = content.trim();
        if !content.is_empty() {
            line.push_str(": ");
            line.push_str(&excerpt(content, ACTIVITY_EXCERPT_CHARS));
        }
    }
    line
}

fn push_activities(parts: &mut Vec<String>, activities: &[Activity]) {
    let rendered: Vec<String> = activities
        .iter()
        .take(MAX_ACTIVITY_EXCERPTS)
        .map(render_activity)
        .collect();
    if !rendered.is_empty() {
        parts.push(format!("Recent activity: {}", rendered.join("; ")));
    }
}

/// Compose the denormalized description of one entity.
///
/// Fails with [`SemanticError::Compose`] only when the entity itself is
/// gone (vanished mid-pipeline); missing related records are simply
/// omitted.
pub async fn compose<S: CrmStore>(
    store: &S,
    kind: EntityKind,
    entity_id: &str,
) -> Result<String, SemanticError> {
    match kind {
        EntityKind::Deal => compose_deal(store, entity_id).await,
        EntityKind::Contact => compose_contact(store, entity_id).await,
        EntityKind::Lead => compose_lead(store, entity_id).await,
    }
}

async fn compose_deal<S: CrmStore>(store: &S, deal_id: &str) -> Result<String, SemanticError> {
    let deal = store
        .get_deal(deal_id)
        .await?
        .ok_or_else(|| SemanticError::Compose(format!("deal {deal_id} not found")))?;

    let mut parts = Vec::new();

    if !deal.title.trim().is_empty() {
        parts.push(format!("Deal: {}", deal.title.trim()));
    }
    if let Some(value) = deal.value {
        parts.push(format!("Value: {value}"));
    }
    if !deal.stage.trim().is_empty() {
        parts.push(format!("Stage: {}", deal.stage.trim()));
    }
    if let Some(probability) = deal.probability {
        parts.push(format!("Probability: {probability}%"));
    }
    if let Some(next_step) = &deal.next_step {
        if !next_step.trim().is_empty() {
            parts.push(format!("Next step: {}", next_step.trim()));
        }
    }

    if let Some(contact_id) = &deal.contact_id {
        if let Some(contact) = store.get_contact(contact_id).await? {
            let mut identity = format!("Contact: {}", contact.name);
            if let Some(title) = &contact.title {
                identity.push_str(&format!(", {title}"));
            }
            if let Some(company) = &contact.company {
                identity.push_str(&format!(" at {company}"));
            }
            parts.push(identity);
        }
    }

    let activities = store.activities_for_deal(deal_id).await?;
    push_activities(&mut parts, &activities);

    Ok(parts.join(". "))
}

async fn compose_contact<S: CrmStore>(
    store: &S,
    contact_id: &str,
) -> Result<String, SemanticError> {
    let contact = store
        .get_contact(contact_id)
        .await?
        .ok_or_else(|| SemanticError::Compose(format!("contact {contact_id} not found")))?;

    let mut parts = Vec::new();

    if !contact.name.trim().is_empty() {
        parts.push(format!("Contact: {}", contact.name.trim()));
    }
    if let Some(title) = &contact.title {
        parts.push(format!("Title: {title}"));
    }
    if let Some(company) = &contact.company {
        parts.push(format!("Company: {company}"));
    }
    if let Some(persona) = &contact.persona {
        if !persona.trim().is_empty() {
            parts.push(format!("Persona: {}", persona.trim()));
        }
    }
    if let Some(notes) = &contact.notes {
        if !notes.trim().is_empty() {
            parts.push(format!("Notes: {}", notes.trim()));
        }
    }

    let deals = store.deals_for_contact(contact_id).await?;
    let rendered: Vec<String> = deals
        .iter()
        .take(MAX_RELATED_DEALS)
        .map(|d| format!("{} ({})", d.title, d.stage))
        .collect();
    if !rendered.is_empty() {
        parts.push(format!("Deals: {}", rendered.join("; ")));
    }

    let activities = store.activities_for_contact(contact_id).await?;
    push_activities(&mut parts, &activities);

    Ok(parts.join(". "))
}

async fn compose_lead<S: CrmStore>(store: &S, lead_id: &str) -> Result<String, SemanticError> {
    let lead = store
        .get_lead(lead_id)
        .await?
        .ok_or_else(|| SemanticError::Compose(format!("lead {lead_id} not found")))?;

    let mut parts = Vec::new();

    if !lead.name.trim().is_empty() {
        parts.push(format!("Lead: {}", lead.name.trim()));
    }
    if let Some(company) = &lead.company {
        parts.push(format!("Company: {company}"));
    }
    if let Some(source) = &lead.source {
        parts.push(format!("Source: {source}"));
    }
    if !lead.status.trim().is_empty() {
        parts.push(format!("Status: {}", lead.status.trim()));
    }
    if let Some(score) = lead.score {
        parts.push(format!("Score: {score}"));
    }

    let activities = store.activities_for_lead(lead_id).await?;
    push_activities(&mut parts, &activities);

    Ok(parts.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_store::MemoryStore;
    use crm_types::{Activity, ActivityKind, Contact, Deal, Lead};

    async fn acme_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_contact(
                Contact::new("contact-1", "user-1", "Dana Reyes")
                    .unwrap()
                    .with_title("VP Engineering")
                    .with_company("Acme"),
            )
            .await
            .unwrap();
        store
            .insert_deal(
                Deal::new("deal-1", "user-1", "Acme Renewal", "Negotiation")
                    .unwrap()
                    .with_value(45_000.0)
                    .with_probability(60)
                    .with_next_step("Send revised quote")
                    .with_contact("contact-1"),
            )
            .await
            .unwrap();
        store
            .insert_activity(
                Activity::new("act-1", "user-1", ActivityKind::Call, "call")
                    .unwrap()
                    .with_content("discussed pricing objection")
                    .with_deal("deal-1"),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_compose_deal_includes_fields_and_activity() {
        let store = acme_store().await;
        let text = compose(&store, EntityKind::Deal, "deal-1").await.unwrap();

        assert!(text.contains("Acme Renewal"));
        assert!(text.contains("Negotiation"));
        assert!(text.contains("pricing objection"));
        assert!(text.contains("Dana Reyes"));
    }

    #[tokio::test]
    async fn test_compose_is_deterministic() {
        let store = acme_store().await;
        let first = compose(&store, EntityKind::Deal, "deal-1").await.unwrap();
        let second = compose(&store, EntityKind::Deal, "deal-1").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_compose_missing_entity_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            compose(&store, EntityKind::Deal, "deal-ghost").await,
            Err(SemanticError::Compose(_))
        ));
    }

    #[tokio::test]
    async fn test_compose_empty_entity_returns_empty_string() {
        let store = MemoryStore::new();
        store
            .insert_lead(Lead::new("lead-1", "user-1", "  ", "").unwrap())
            .await
            .unwrap();

        let text = compose(&store, EntityKind::Lead, "lead-1").await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_compose_bounds_activity_excerpts() {
        let store = MemoryStore::new();
        store
            .insert_lead(Lead::new("lead-1", "user-1", "Sam Ortiz", "new").unwrap())
            .await
            .unwrap();
        for i in 0..10 {
            store
                .insert_activity(
                    Activity::new(format!("act-{i}"), "user-1", ActivityKind::Note, format!("note {i}"))
                        .unwrap()
                        .with_content("z".repeat(ACTIVITY_EXCERPT_CHARS * 2))
                        .with_lead("lead-1"),
                )
                .await
                .unwrap();
        }

        let text = compose(&store, EntityKind::Lead, "lead-1").await.unwrap();
        let note_count = text.matches("[note]").count();
        assert_eq!(note_count, MAX_ACTIVITY_EXCERPTS);

        // Each excerpt is bounded, so the whole blob stays bounded too
        assert!(text.chars().count() < MAX_ACTIVITY_EXCERPTS * (ACTIVITY_EXCERPT_CHARS + 50) + 200);
    }

    #[tokio::test]
    async fn test_compose_contact_includes_related_deals() {
        let store = acme_store().await;
        let text = compose(&store, EntityKind::Contact, "contact-1")
            .await
            .unwrap();

        assert!(text.contains("Dana Reyes"));
        assert!(text.contains("Acme Renewal (Negotiation)"));
    }
}
