//! Export orchestration split into focused submodules.
//!
//! The `ExportOrchestrator` struct and its methods are organized by domain:
//! - [`run`] - End-to-end attempt lifecycle and outcome mapping
//! - [`creator`] - Direct/chunked job creation and the threshold decision
//! - [`poller`] - Bounded fixed-interval status polling
//! - [`artifact`] - Artifact retrieval and local save

mod artifact;
mod creator;
mod poller;
mod run;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use run::ExportRequest;

use crate::backend::{ExportBackend, HttpBackend, RecordSource};
use crate::config::Config;
use crate::error::Result;
use crate::types::{AttemptId, ExportEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;

/// Main export orchestrator (cloneable - all fields are Arc-wrapped)
///
/// Drives the full pipeline for each attempt: selection resolution, job
/// creation, status polling, artifact download. Attempts are independent;
/// the only shared resource is the event broadcast channel.
#[derive(Clone)]
pub struct ExportOrchestrator {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Identifier listing/counting source
    pub(crate) source: Arc<dyn RecordSource>,
    /// Export pipeline backend
    pub(crate) backend: Arc<dyn ExportBackend>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<ExportEvent>,
    /// Map of in-flight attempts to their cancellation tokens
    ///
    /// An attempt is only present while its selection is being resolved;
    /// once the job is submitted the entry is removed and cancellation no
    /// longer applies (the background job keeps running server-side).
    pub(crate) active_attempts:
        Arc<tokio::sync::Mutex<HashMap<AttemptId, tokio_util::sync::CancellationToken>>>,
    /// Next attempt ID counter
    pub(crate) next_attempt_id: Arc<AtomicI64>,
}

impl ExportOrchestrator {
    /// Create an orchestrator backed by the HTTP backend from `config`
    pub fn new(config: Config) -> Result<Self> {
        let http = Arc::new(HttpBackend::new(&config.backend)?);
        Ok(Self::with_backend(config, http.clone(), http))
    }

    /// Create an orchestrator with explicit backend implementations
    ///
    /// Primary seam for tests and for embedders that already have their own
    /// transport layer.
    pub fn with_backend(
        config: Config,
        source: Arc<dyn RecordSource>,
        backend: Arc<dyn ExportBackend>,
    ) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_buffer_size.max(1));

        Self {
            config: Arc::new(config),
            source,
            backend,
            event_tx,
            active_attempts: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            next_attempt_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Subscribe to export events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently. Events are buffered, but a subscriber that
    /// falls behind by more than the configured buffer size receives a
    /// `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ExportEvent> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Cancel an attempt's selection resolution
    ///
    /// Returns `true` if the attempt was still resolving and its token was
    /// signalled. Returns `false` once the job has been submitted: the
    /// background job continues server-side and can be picked up later
    /// through a job-history view.
    pub async fn cancel(&self, attempt: AttemptId) -> bool {
        let active = self.active_attempts.lock().await;
        match active.get(&attempt) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// export processing never depends on anyone listening.
    pub(crate) fn emit_event(&self, event: ExportEvent) {
        self.event_tx.send(event).ok();
    }
}
