//! Bounded fixed-interval status polling.

use crate::error::{Error, Result};
use crate::types::{AttemptId, ExportEvent, ExportJob, JobStatus};

use super::ExportOrchestrator;

impl ExportOrchestrator {
    /// Watch a job until it reaches a terminal state or the attempt budget
    /// runs out.
    ///
    /// The interval is fixed, with no backoff, which bounds the worst-case
    /// wall-clock time at `poll_interval * poll_max_attempts`. Every query
    /// emits a [`ExportEvent::PollProgress`] even when nothing changed, so a
    /// sink can render elapsed-time feedback. A query-level network error is
    /// a transient hiccup: it consumes an attempt and the loop continues.
    ///
    /// A job already terminal on entry is settled without any query.
    pub(crate) async fn poll_until_terminal(
        &self,
        attempt: AttemptId,
        mut job: ExportJob,
    ) -> Result<ExportJob> {
        if job.status.is_terminal() {
            return Self::settle(job);
        }

        let interval = self.config.job.poll_interval;
        let max_attempts = self.config.job.poll_max_attempts;

        for poll_attempt in 1..=max_attempts {
            match self.backend.fetch_status(&job.id).await {
                Ok(snapshot) => {
                    job.status = snapshot.status;
                    job.progress_percentage = snapshot.progress_percentage;
                    if snapshot.descriptor.is_some() {
                        job.descriptor = snapshot.descriptor;
                    }
                    if snapshot.error_message.is_some() {
                        job.error_message = snapshot.error_message;
                    }
                }
                Err(e) => {
                    // Transient: the attempt is consumed, the loop goes on
                    tracing::warn!(
                        export_id = %job.id,
                        poll_attempt,
                        error = %e,
                        "status query failed, continuing to next attempt"
                    );
                }
            }

            self.emit_event(ExportEvent::PollProgress {
                attempt,
                export_id: job.id.clone(),
                status: job.status,
                percentage: job.progress_percentage,
                poll_attempt,
            });

            if job.status.is_terminal() {
                tracing::info!(
                    export_id = %job.id,
                    status = %job.status,
                    poll_attempt,
                    "job reached terminal state"
                );
                return Self::settle(job);
            }

            if poll_attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(Error::PollTimeout {
            export_id: job.id,
            attempts: max_attempts,
        })
    }

    /// Map a terminal job to the poller's result: completed jobs pass
    /// through, failed ones become [`Error::JobFailed`] carrying the
    /// backend's message verbatim.
    fn settle(job: ExportJob) -> Result<ExportJob> {
        match job.status {
            JobStatus::Failed => Err(Error::JobFailed {
                message: job
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "no failure detail provided".to_string()),
                export_id: job.id,
            }),
            _ => Ok(job),
        }
    }
}
