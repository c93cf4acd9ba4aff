//! End-to-end attempt lifecycle: resolution, creation, polling, download.

use crate::resolver::{self, ResolveContext};
use crate::types::{
    AttemptId, ExportEvent, ExportOutcome, ExportPhase, FilterCriteria, JobStatus, SelectionMode,
};
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

use super::ExportOrchestrator;

/// Everything needed to start one export attempt
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Kind of record being exported (e.g. "contact", "company"); used for
    /// diagnostics, never interpreted
    pub entity: String,
    /// How the record set is chosen
    pub mode: SelectionMode,
    /// Pre-selected identifiers (used by [`SelectionMode::Selected`])
    pub selected_ids: Vec<String>,
    /// Currently visible page's identifiers
    /// (used by [`SelectionMode::CurrentPage`])
    pub page_ids: Vec<String>,
    /// Active filter criteria (used by the filter-driven modes)
    pub criteria: FilterCriteria,
}

impl ExportRequest {
    /// Convenience constructor for the filter-driven modes
    pub fn filtered(entity: impl Into<String>, mode: SelectionMode, criteria: FilterCriteria) -> Self {
        Self {
            entity: entity.into(),
            mode,
            selected_ids: Vec::new(),
            page_ids: Vec::new(),
            criteria,
        }
    }
}

impl ExportOrchestrator {
    /// Run one export attempt to its terminal outcome.
    ///
    /// Drives the pipeline `Resolving → Creating → Polling → download`,
    /// emitting [`ExportEvent`]s along the way. Never returns an `Err`:
    /// every failure mode is represented in the [`ExportOutcome`] so a
    /// presentation layer can render all of them without a catch-all
    /// handler.
    ///
    /// The attempt is cancellable (via [`cancel`](Self::cancel)) only while
    /// its selection is being resolved. Once the job has been submitted,
    /// the attempt runs to a terminal outcome; the server-side job is never
    /// abandoned mid-flight by closing the initiating screen.
    pub async fn run_export(&self, request: ExportRequest) -> ExportOutcome {
        let attempt = AttemptId(self.next_attempt_id.fetch_add(1, Ordering::SeqCst));
        let cancel = CancellationToken::new();
        self.active_attempts
            .lock()
            .await
            .insert(attempt, cancel.clone());

        let outcome = self.run_attempt(attempt, &request, &cancel).await;

        // The entry is normally removed when resolution finishes; make sure
        // early exits do not leave it behind.
        self.active_attempts.lock().await.remove(&attempt);
        outcome
    }

    async fn run_attempt(
        &self,
        attempt: AttemptId,
        request: &ExportRequest,
        cancel: &CancellationToken,
    ) -> ExportOutcome {
        // --- Phase 1: resolve the selection into identifiers ---
        self.emit_event(ExportEvent::PhaseChanged {
            attempt,
            phase: ExportPhase::Resolving,
        });

        let (progress_tx, mut progress_rx) =
            tokio::sync::mpsc::unbounded_channel::<crate::types::ProgressSnapshot>();
        let event_tx = self.event_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(snap) = progress_rx.recv().await {
                event_tx
                    .send(ExportEvent::ScanProgress {
                        attempt,
                        fetched: snap.fetched,
                        total: snap.total,
                        percentage: snap.percentage,
                    })
                    .ok();
            }
        });

        let ctx = ResolveContext {
            selected_ids: request.selected_ids.clone(),
            page_ids: request.page_ids.clone(),
            criteria: request.criteria.clone(),
        };

        let resolved = resolver::resolve(
            self.source.as_ref(),
            &request.mode,
            &ctx,
            self.config.scan.page_size,
            cancel,
            Some(&progress_tx),
        )
        .await;

        // Let buffered scan progress drain before any later event
        drop(progress_tx);
        forwarder.await.ok();

        // Resolution is over; from here on cancellation no longer applies
        self.active_attempts.lock().await.remove(&attempt);

        let resolved = match resolved {
            Ok(r) => r,
            Err(e) => {
                return self.fail(attempt, e.to_string());
            }
        };

        if resolved.cancelled {
            tracing::info!(
                %attempt,
                fetched = resolved.ids.len(),
                "export cancelled during resolution"
            );
            self.emit_event(ExportEvent::Cancelled {
                attempt,
                fetched: resolved.ids.len() as u64,
            });
            self.emit_event(ExportEvent::PhaseChanged {
                attempt,
                phase: ExportPhase::Cancelled,
            });
            return ExportOutcome::Cancelled {
                fetched: resolved.ids.len() as u64,
            };
        }

        if resolved.ids.is_empty() {
            self.emit_event(ExportEvent::NothingToExport { attempt });
            self.emit_event(ExportEvent::PhaseChanged {
                attempt,
                phase: ExportPhase::Completed,
            });
            return ExportOutcome::NothingToExport;
        }

        // --- Phase 2: submit the identifier list ---
        self.emit_event(ExportEvent::PhaseChanged {
            attempt,
            phase: ExportPhase::Creating,
        });

        let job = match self
            .create_job(attempt, &request.entity, &resolved.ids)
            .await
        {
            Ok(job) => job,
            Err(e) => {
                return self.fail(attempt, e.to_string());
            }
        };

        // --- Phase 3: watch the background job ---
        // Trivially small exports can come back already completed; those
        // never enter the polling loop.
        let job = if job.status == JobStatus::Completed {
            job
        } else {
            self.emit_event(ExportEvent::PhaseChanged {
                attempt,
                phase: ExportPhase::Polling,
            });

            match self.poll_until_terminal(attempt, job).await {
                Ok(job) => job,
                Err(crate::error::Error::PollTimeout {
                    export_id,
                    attempts,
                }) => {
                    self.emit_event(ExportEvent::TimedOut {
                        attempt,
                        export_id: export_id.clone(),
                        attempts,
                    });
                    self.emit_event(ExportEvent::PhaseChanged {
                        attempt,
                        phase: ExportPhase::Failed,
                    });
                    return ExportOutcome::TimedOut {
                        export_id,
                        attempts,
                    };
                }
                Err(e) => {
                    return self.fail(attempt, e.to_string());
                }
            }
        };

        // --- Phase 4: retrieve the artifact ---
        let artifact_path = match self.download_artifact(attempt, &job).await {
            Ok(path) => path,
            Err(e) => {
                return self.fail(attempt, e.to_string());
            }
        };

        self.emit_event(ExportEvent::Completed {
            attempt,
            export_id: job.id.clone(),
        });
        self.emit_event(ExportEvent::PhaseChanged {
            attempt,
            phase: ExportPhase::Completed,
        });

        ExportOutcome::Completed {
            job,
            artifact_path,
        }
    }

    /// Emit the failure events and build the failed outcome
    fn fail(&self, attempt: AttemptId, message: String) -> ExportOutcome {
        tracing::error!(%attempt, error = %message, "export attempt failed");
        self.emit_event(ExportEvent::Failed {
            attempt,
            message: message.clone(),
        });
        self.emit_event(ExportEvent::PhaseChanged {
            attempt,
            phase: ExportPhase::Failed,
        });
        ExportOutcome::Failed { message }
    }
}
