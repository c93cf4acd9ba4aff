//! Backend access traits and the HTTP implementation.
//!
//! The orchestrator only ever talks to the backend through the
//! [`RecordSource`] and [`ExportBackend`] traits, so tests can substitute
//! in-memory fakes and the HTTP wiring stays confined to [`HttpBackend`].

mod http;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use http::HttpBackend;

use crate::error::Result;
use crate::types::{DownloadDescriptor, ExportId, ExportJob, FilterCriteria, JobStatus};
use async_trait::async_trait;

/// One page of identifiers from the listing source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdPage {
    /// Identifiers in server-returned order
    pub ids: Vec<String>,
    /// Whether the source reports this as the final page
    pub is_last: bool,
}

/// A status query's view of a job
///
/// Merged into the attempt's [`ExportJob`] by the poller; fields absent from
/// the response leave the job's previous values untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Status reported by the backend
    pub status: JobStatus,
    /// Completion percentage reported by the backend
    pub progress_percentage: u8,
    /// Retrieval handle, once the backend exposes one
    pub descriptor: Option<DownloadDescriptor>,
    /// Failure message (status == failed)
    pub error_message: Option<String>,
}

/// Source of record identifiers matching a filter
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page of matching identifiers at the given window
    async fn list_ids(
        &self,
        criteria: &FilterCriteria,
        offset: usize,
        limit: usize,
    ) -> Result<IdPage>;

    /// Count all matching identifiers without fetching them
    async fn count(&self, criteria: &FilterCriteria) -> Result<u64>;
}

/// Export pipeline operations (creation, status, artifact retrieval)
#[async_trait]
pub trait ExportBackend: Send + Sync {
    /// Submit the full identifier list as one direct export job
    async fn create_export(&self, ids: &[String]) -> Result<ExportJob>;

    /// Submit the full identifier list for backend-side partitioning,
    /// returning the single primary job handle
    async fn create_chunked_export(&self, ids: &[String]) -> Result<ExportJob>;

    /// Query a job's current status
    async fn fetch_status(&self, id: &ExportId) -> Result<StatusSnapshot>;

    /// Retrieve the binary artifact for a completed job
    async fn fetch_artifact(&self, descriptor: &DownloadDescriptor) -> Result<Vec<u8>>;
}
