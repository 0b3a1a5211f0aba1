//! Change fan-out: recompute composite vectors of the entities an activity
//! mutation touches.
//!
//! The recomputations are independent: all are scheduled, all are awaited
//! (settle-all), and one failure never prevents the others from
//! completing. The settle-all join enforces that mechanically instead of
//! relying on per-call try/catch convention.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crm_store::CrmStore;
use crm_types::{ChangeKind, EntityKind};

use crate::service::CompositeEmbeddingService;

/// An activity mutation naming the entities it touches.
#[derive(Debug, Clone)]
pub struct ActivityChange {
    /// What happened to the activity
    pub change: ChangeKind,

    /// Deal the activity is linked to, if any
    pub deal_id: Option<String>,

    /// Contact the activity is linked to, if any
    pub contact_id: Option<String>,

    /// Lead the activity is linked to, if any
    pub lead_id: Option<String>,

    /// Owning user (tenant scope)
    pub user_id: String,
}

impl ActivityChange {
    pub fn new(change: ChangeKind, user_id: impl Into<String>) -> Self {
        Self {
            change,
            deal_id: None,
            contact_id: None,
            lead_id: None,
            user_id: user_id.into(),
        }
    }

    pub fn with_deal(mut self, deal_id: impl Into<String>) -> Self {
        self.deal_id = Some(deal_id.into());
        self
    }

    pub fn with_contact(mut self, contact_id: impl Into<String>) -> Self {
        self.contact_id = Some(contact_id.into());
        self
    }

    pub fn with_lead(mut self, lead_id: impl Into<String>) -> Self {
        self.lead_id = Some(lead_id.into());
        self
    }
}

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanoutReport {
    /// Entities whose composite vector was recomputed
    pub updated: usize,
    /// Entities whose recomputation failed
    pub failed: usize,
}

/// Triggers composite recomputation for the entities named by an activity
/// change. Invoked synchronously by the code path that wrote the activity,
/// so the staleness window is bounded by the caller.
pub struct FanoutCoordinator<S: CrmStore> {
    service: Arc<CompositeEmbeddingService<S>>,
}

impl<S: CrmStore> FanoutCoordinator<S> {
    pub fn new(service: Arc<CompositeEmbeddingService<S>>) -> Self {
        Self { service }
    }

    /// Recompute the composite vectors of every entity the change names.
    ///
    /// Never fails: individual recomputation errors are logged and counted.
    pub async fn on_activity_change(&self, change: &ActivityChange) -> FanoutReport {
        let mut targets: Vec<(EntityKind, &str)> = Vec::new();
        if let Some(id) = &change.deal_id {
            targets.push((EntityKind::Deal, id));
        }
        if let Some(id) = &change.contact_id {
            targets.push((EntityKind::Contact, id));
        }
        if let Some(id) = &change.lead_id {
            targets.push((EntityKind::Lead, id));
        }

        if targets.is_empty() {
            debug!(change = change.change.as_str(), "Activity change names no entities");
            return FanoutReport::default();
        }

        let results = join_all(
            targets
                .iter()
                .map(|(kind, id)| self.service.update_composite(*kind, id, &change.user_id)),
        )
        .await;

        let mut report = FanoutReport::default();
        for ((kind, id), result) in targets.iter().zip(results) {
            match result {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(kind = %kind, entity_id = %id, error = %e, "Composite recomputation failed");
                    report.failed += 1;
                }
            }
        }

        debug!(
            change = change.change.as_str(),
            updated = report.updated,
            failed = report.failed,
            "Fan-out complete"
        );
        report
    }
}
