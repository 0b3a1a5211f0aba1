//! Batch backfill engine: generate missing composite vectors in paced,
//! bounded-size batches.

use std::sync::Arc;

use futures::future::join_all;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crm_store::CrmStore;
use crm_types::EntityKind;

use crate::error::SemanticError;
use crate::service::CompositeEmbeddingService;

/// Cumulative counts from one backfill run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Entities whose pipeline completed (including skips and fallbacks)
    pub processed: usize,
    /// Entities whose pipeline failed
    pub errors: usize,
}

impl BackfillReport {
    /// Merge another report into this one.
    pub fn merge(&mut self, other: &BackfillReport) {
        self.processed += other.processed;
        self.errors += other.errors;
    }
}

/// Finds entities lacking composite vectors and processes them in batches.
///
/// Within a batch the per-entity pipelines run concurrently (bounded
/// parallelism = batch size); between batches the engine pauses to stay
/// under provider rate limits. One entity's failure never aborts siblings;
/// only infrastructure failures (the candidate scan itself) abort the run.
pub struct BackfillEngine<S: CrmStore> {
    service: Arc<CompositeEmbeddingService<S>>,
}

impl<S: CrmStore> BackfillEngine<S> {
    pub fn new(service: Arc<CompositeEmbeddingService<S>>) -> Self {
        Self { service }
    }

    /// Backfill missing composite vectors for one user's entities of `kind`.
    pub async fn backfill(
        &self,
        kind: EntityKind,
        user_id: &str,
    ) -> Result<BackfillReport, SemanticError> {
        if !self.service.is_configured() {
            info!(kind = %kind, "Provider unconfigured, skipping backfill");
            return Ok(BackfillReport::default());
        }

        let batch_size = self.service.config().backfill.batch_size;
        let pause = Duration::from_millis(self.service.config().backfill.batch_pause_ms);

        let candidates = self
            .service
            .store()
            .entities_missing_composite(kind, user_id)
            .await?;

        if candidates.is_empty() {
            info!(kind = %kind, "No entities missing composite vectors");
            return Ok(BackfillReport::default());
        }

        info!(
            kind = %kind,
            candidates = candidates.len(),
            batch_size,
            "Starting backfill"
        );

        let mut report = BackfillReport::default();
        let batches: Vec<&[String]> = candidates.chunks(batch_size).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let results = join_all(batch.iter().map(|entity_id| {
                self.service
                    .generate_composite(kind, entity_id, user_id)
            }))
            .await;

            for (entity_id, result) in batch.iter().zip(results) {
                match result {
                    Ok(()) => report.processed += 1,
                    Err(e) => {
                        warn!(kind = %kind, entity_id = %entity_id, error = %e, "Backfill entity failed");
                        report.errors += 1;
                    }
                }
            }

            if index + 1 < batch_count {
                sleep(pause).await;
            }
        }

        info!(
            kind = %kind,
            processed = report.processed,
            errors = report.errors,
            "Backfill complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge() {
        let mut report = BackfillReport {
            processed: 5,
            errors: 1,
        };
        report.merge(&BackfillReport {
            processed: 2,
            errors: 0,
        });
        assert_eq!(
            report,
            BackfillReport {
                processed: 7,
                errors: 1
            }
        );
    }
}
