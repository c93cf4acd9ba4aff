//! Shared test helpers for orchestrator tests: in-memory fakes for the
//! record source and export backend, plus a preconfigured orchestrator.

use crate::backend::{ExportBackend, IdPage, RecordSource, StatusSnapshot};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::orchestrator::ExportOrchestrator;
use crate::types::{
    CreationStrategy, DownloadDescriptor, ExportId, ExportJob, FilterCriteria, JobStatus,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory record source over `n` generated identifiers.
pub(crate) struct FakeSource {
    pub ids: Vec<String>,
    pub list_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    /// Delay applied to every page after the first (lets tests cancel
    /// mid-scan deterministically enough)
    pub page_delay: Option<Duration>,
}

impl FakeSource {
    pub fn with_records(n: usize) -> Self {
        Self {
            ids: (0..n).map(|i| format!("rec-{i}")).collect(),
            list_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            page_delay: None,
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn list_ids(
        &self,
        _criteria: &FilterCriteria,
        offset: usize,
        limit: usize,
    ) -> Result<IdPage> {
        let call_no = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call_no > 1
            && let Some(delay) = self.page_delay
        {
            tokio::time::sleep(delay).await;
        }

        let end = (offset + limit).min(self.ids.len());
        let ids = if offset >= self.ids.len() {
            Vec::new()
        } else {
            self.ids[offset..end].to_vec()
        };
        Ok(IdPage {
            is_last: end >= self.ids.len(),
            ids,
        })
    }

    async fn count(&self, _criteria: &FilterCriteria) -> Result<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ids.len() as u64)
    }
}

/// In-memory export backend with scripted status responses.
pub(crate) struct FakeBackend {
    pub direct_calls: AtomicUsize,
    pub chunked_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub artifact_calls: AtomicUsize,
    /// The identifier list received by the most recent creation call
    pub last_ids: Mutex<Vec<String>>,
    /// Status the job carries when creation returns
    pub created_status: Mutex<JobStatus>,
    /// Descriptor attached to the job at creation (direct path only)
    pub created_descriptor: Mutex<Option<DownloadDescriptor>>,
    /// Scripted status-query responses, popped front to back; once empty,
    /// every further query reports `pending`
    pub statuses: Mutex<VecDeque<Result<StatusSnapshot>>>,
    /// Artifact bytes served on download
    pub artifact: Vec<u8>,
    /// Whether creation calls fail
    pub fail_creation: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            direct_calls: AtomicUsize::new(0),
            chunked_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            artifact_calls: AtomicUsize::new(0),
            last_ids: Mutex::new(Vec::new()),
            created_status: Mutex::new(JobStatus::Pending),
            created_descriptor: Mutex::new(None),
            statuses: Mutex::new(VecDeque::new()),
            artifact: b"id,name\n1,test\n".to_vec(),
            fail_creation: false,
        }
    }

    /// Replace the scripted status-query responses.
    pub fn script_statuses(&self, snapshots: Vec<Result<StatusSnapshot>>) {
        *self.statuses.lock().unwrap() = snapshots.into();
    }

    pub fn direct_calls(&self) -> usize {
        self.direct_calls.load(Ordering::SeqCst)
    }

    pub fn chunked_calls(&self) -> usize {
        self.chunked_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn artifact_calls(&self) -> usize {
        self.artifact_calls.load(Ordering::SeqCst)
    }

    fn make_job(&self, ids: &[String], strategy: CreationStrategy) -> Result<ExportJob> {
        if self.fail_creation {
            return Err(Error::Backend {
                status: 422,
                message: "quota exceeded".to_string(),
            });
        }
        *self.last_ids.lock().unwrap() = ids.to_vec();
        let status = *self.created_status.lock().unwrap();
        Ok(ExportJob {
            id: ExportId::new("exp-1"),
            status,
            strategy,
            record_count: ids.len() as u64,
            progress_percentage: if status == JobStatus::Completed { 100 } else { 0 },
            descriptor: self.created_descriptor.lock().unwrap().clone(),
            expires_at: None,
            error_message: None,
        })
    }
}

#[async_trait]
impl ExportBackend for FakeBackend {
    async fn create_export(&self, ids: &[String]) -> Result<ExportJob> {
        self.direct_calls.fetch_add(1, Ordering::SeqCst);
        self.make_job(ids, CreationStrategy::Direct)
    }

    async fn create_chunked_export(&self, ids: &[String]) -> Result<ExportJob> {
        self.chunked_calls.fetch_add(1, Ordering::SeqCst);
        self.make_job(ids, CreationStrategy::Chunked)
    }

    async fn fetch_status(&self, _id: &ExportId) -> Result<StatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.statuses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(snapshot(JobStatus::Pending, 0)),
        }
    }

    async fn fetch_artifact(&self, _descriptor: &DownloadDescriptor) -> Result<Vec<u8>> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.artifact.clone())
    }
}

/// Build a plain status snapshot without a descriptor.
pub(crate) fn snapshot(status: JobStatus, percentage: u8) -> StatusSnapshot {
    StatusSnapshot {
        status,
        progress_percentage: percentage,
        descriptor: None,
        error_message: None,
    }
}

/// Build a `completed` snapshot carrying a descriptor for the given job.
pub(crate) fn completed_snapshot(export_id: &str) -> StatusSnapshot {
    StatusSnapshot {
        status: JobStatus::Completed,
        progress_percentage: 100,
        descriptor: Some(descriptor(export_id)),
        error_message: None,
    }
}

/// Standard test descriptor for the given job.
pub(crate) fn descriptor(export_id: &str) -> DownloadDescriptor {
    DownloadDescriptor {
        export_id: ExportId::new(export_id),
        token: "tok-123".to_string(),
    }
}

/// Helper to create a test orchestrator over the given fakes, with a fast
/// poll cadence and a temp download directory. Returns the orchestrator and
/// the tempdir (which must be kept alive).
pub(crate) fn create_test_orchestrator(
    source: Arc<FakeSource>,
    backend: Arc<FakeBackend>,
) -> (ExportOrchestrator, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("exports");
    config.job.poll_interval = Duration::from_millis(1);
    config.job.poll_max_attempts = 10;
    config.scan.page_size = 100;

    let orchestrator = ExportOrchestrator::with_backend(config, source, backend);
    (orchestrator, temp_dir)
}
