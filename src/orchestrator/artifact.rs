//! Artifact retrieval and local save.

use crate::error::{Error, Result};
use crate::types::{AttemptId, ExportEvent, ExportJob, JobStatus};
use std::path::PathBuf;

use super::ExportOrchestrator;

impl ExportOrchestrator {
    /// Download a completed job's artifact and save it locally.
    ///
    /// Preconditions are checked before any network call: the job must be
    /// `Completed` and must carry a usable descriptor. The file is named
    /// deterministically from the job identifier inside the configured
    /// download directory. This is a terminal, non-retried operation: a
    /// failure here never re-triggers creation or polling.
    pub(crate) async fn download_artifact(
        &self,
        attempt: AttemptId,
        job: &ExportJob,
    ) -> Result<PathBuf> {
        if job.status != JobStatus::Completed {
            return Err(Error::validation(format!(
                "cannot download artifact for export {} in status {}",
                job.id, job.status
            )));
        }

        let descriptor = job.descriptor.as_ref().ok_or(Error::MissingDescriptor {
            export_id: job.id.clone(),
        })?;

        let bytes = self.backend.fetch_artifact(descriptor).await?;

        let dir = &self.config.download.download_dir;
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "failed to create download directory '{}': {}",
                    dir.display(),
                    e
                ),
            ))
        })?;

        let path = dir.join(format!("export_{}.csv", job.id));
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(
            export_id = %job.id,
            path = %path.display(),
            size_bytes = bytes.len(),
            "artifact saved"
        );

        self.emit_event(ExportEvent::ArtifactSaved {
            attempt,
            export_id: job.id.clone(),
            path: path.clone(),
        });

        Ok(path)
    }
}
