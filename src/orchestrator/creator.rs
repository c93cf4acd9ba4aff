//! Export job creation and the direct/chunked threshold decision.

use crate::error::{Error, Result};
use crate::types::{AttemptId, ExportEvent, ExportJob};

use super::ExportOrchestrator;

impl ExportOrchestrator {
    /// Submit a resolved identifier list and return the job handle.
    ///
    /// Below the configured chunk threshold the direct endpoint is used; at
    /// or above it, the chunked endpoint receives the whole list in one
    /// request and the backend does its own partitioning; there is no
    /// client-side fan-out. Both paths yield the same [`ExportJob`] shape,
    /// so polling and download stay strategy-agnostic.
    ///
    /// Creation failure is terminal for the attempt: no retry, surfaced
    /// with the entity kind and attempted count.
    pub(crate) async fn create_job(
        &self,
        attempt: AttemptId,
        entity: &str,
        ids: &[String],
    ) -> Result<ExportJob> {
        let threshold = self.config.job.chunk_threshold;

        let result = if ids.len() < threshold {
            tracing::info!(
                entity,
                count = ids.len(),
                threshold,
                "creating direct export"
            );
            self.backend.create_export(ids).await
        } else {
            tracing::info!(
                entity,
                count = ids.len(),
                threshold,
                "creating chunked export"
            );
            self.backend.create_chunked_export(ids).await
        };

        let job = result.map_err(|e| Error::Creation {
            entity: entity.to_string(),
            count: ids.len(),
            source: Box::new(e),
        })?;

        self.emit_event(ExportEvent::JobCreated {
            attempt,
            export_id: job.id.clone(),
            strategy: job.strategy,
            record_count: job.record_count,
        });

        Ok(job)
    }
}
