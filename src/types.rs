//! Core types for bulk-export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a server-side export job
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportId(pub String);

impl ExportId {
    /// Create a new ExportId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExportId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ExportId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ExportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for one export attempt within this process
///
/// Allocated per `run_export` call so that events from concurrent attempts
/// can be told apart and a single attempt can be cancelled without affecting
/// the others. Not persisted and not meaningful to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(pub i64);

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Background job status as reported by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted but not yet started
    Pending,
    /// Actively being produced
    Processing,
    /// Artifact is ready for download
    Completed,
    /// Backend gave up on the job
    Failed,
}

impl JobStatus {
    /// Whether the job can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Which creation endpoint produced a job
///
/// Tagged explicitly at the response boundary so downstream polling and
/// download code never branches on response shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationStrategy {
    /// Single request, backend processes the list as one job
    Direct,
    /// Single request, backend partitions into sub-jobs internally
    Chunked,
}

/// How the set of records to export is chosen
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionMode {
    /// The caller's explicitly pre-selected records
    Selected,
    /// The records on the currently visible page
    CurrentPage,
    /// The first N records matching the active filters
    FirstN {
        /// Requested record count (validated positive before any network call)
        count: i64,
    },
    /// Every record matching the active filters
    All,
}

/// Opaque filter description passed through to listing/counting endpoints
///
/// The core never inspects the contents; only the HTTP layer serializes it
/// into request parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterCriteria {
    /// Discrete query parameters, forwarded verbatim
    Params(Vec<(String, String)>),
    /// A search-criteria source URL produced by an external parser; the
    /// backend resolves it server-side
    SourceUrl(String),
}

impl FilterCriteria {
    /// Criteria matching everything (no filter parameters)
    pub fn empty() -> Self {
        Self::Params(Vec::new())
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::empty()
    }
}

/// Point-in-time progress of an identifier scan
///
/// Derived, not authoritative: `percentage` is recomputed from
/// `fetched`/`total` and is 0 when the total is unknown or zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Identifiers accumulated so far
    pub fetched: u64,
    /// Target total (0 when unknown)
    pub total: u64,
    /// Rounded completion percentage in [0, 100]
    pub percentage: u8,
}

impl ProgressSnapshot {
    /// Build a snapshot, deriving the percentage
    pub fn new(fetched: u64, total: u64) -> Self {
        let percentage = if total > 0 {
            ((fetched as f64 / total as f64) * 100.0).round().min(100.0) as u8
        } else {
            0
        };
        Self {
            fetched,
            total,
            percentage,
        }
    }
}

/// Structured handle for retrieving a completed job's artifact
///
/// Populated once at the response boundary from the backend's download URL;
/// downstream code never re-parses URL strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDescriptor {
    /// The export job the artifact belongs to
    pub export_id: ExportId,
    /// Single-use retrieval token
    pub token: String,
}

/// A server-side export job as seen by this client
///
/// Created by the job creator, mutated only by the status poller until a
/// terminal state is reached. Never deleted client-side; artifact disposal
/// after expiry is the backend's responsibility.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    /// Backend job identifier
    pub id: ExportId,
    /// Current status (monotonic: pending → processing → completed/failed)
    pub status: JobStatus,
    /// Which creation endpoint produced this job
    pub strategy: CreationStrategy,
    /// Number of records covered by the job
    pub record_count: u64,
    /// Backend-reported completion percentage
    pub progress_percentage: u8,
    /// Retrieval handle, present once the artifact is ready
    pub descriptor: Option<DownloadDescriptor>,
    /// When the server-side artifact expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Backend-reported failure message (status == failed)
    pub error_message: Option<String>,
}

/// Phase of an export attempt's lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPhase {
    /// Not yet started
    Idle,
    /// Resolving the selection into a concrete identifier list
    Resolving,
    /// Submitting the identifier list to the backend
    Creating,
    /// Watching the background job
    Polling,
    /// Artifact downloaded and saved
    Completed,
    /// Attempt ended in error
    Failed,
    /// Resolution was cancelled by the user
    Cancelled,
}

/// Event emitted during an export attempt's lifecycle
///
/// Consumed by a presentation layer via the orchestrator's broadcast channel;
/// multiple subscribers each receive every event independently.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    /// The attempt moved to a new lifecycle phase
    PhaseChanged {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// The phase just entered
        phase: ExportPhase,
    },

    /// Identifier scan progress update (one per fetched page)
    ScanProgress {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Identifiers accumulated so far
        fetched: u64,
        /// Target total (0 when unknown)
        total: u64,
        /// Rounded completion percentage
        percentage: u8,
    },

    /// Backend accepted the identifier list and returned a job handle
    JobCreated {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Backend job identifier
        export_id: ExportId,
        /// Direct or chunked creation path
        strategy: CreationStrategy,
        /// Number of records submitted
        record_count: u64,
    },

    /// Status query result (one per poll, even without a state change)
    PollProgress {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Backend job identifier
        export_id: ExportId,
        /// Status observed by this query
        status: JobStatus,
        /// Backend-reported completion percentage
        percentage: u8,
        /// 1-based poll attempt number
        poll_attempt: u32,
    },

    /// Artifact bytes were written to the local filesystem
    ArtifactSaved {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Backend job identifier
        export_id: ExportId,
        /// Local path of the saved artifact
        path: PathBuf,
    },

    /// The attempt finished successfully
    Completed {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Backend job identifier
        export_id: ExportId,
    },

    /// The selection resolved to zero identifiers; nothing was submitted
    NothingToExport {
        /// Attempt this event belongs to
        attempt: AttemptId,
    },

    /// The user cancelled resolution; no job was created
    Cancelled {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Identifiers accumulated before cancellation
        fetched: u64,
    },

    /// The poll budget ran out before the job reached a terminal state
    ///
    /// The job may still complete server-side; the sink should direct the
    /// user to a job-history view rather than report a failure.
    TimedOut {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Backend job identifier
        export_id: ExportId,
        /// Number of status queries made
        attempts: u32,
    },

    /// The attempt failed
    Failed {
        /// Attempt this event belongs to
        attempt: AttemptId,
        /// Human-readable failure description
        message: String,
    },
}

/// Terminal result of one export attempt
///
/// Every failure mode is represented here as data rather than a propagated
/// error, so a presentation layer can render each one without a catch-all
/// handler.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// Job completed and the artifact was saved locally
    Completed {
        /// The terminal job
        job: ExportJob,
        /// Local path of the saved artifact
        artifact_path: PathBuf,
    },
    /// The selection resolved to zero identifiers
    NothingToExport,
    /// Resolution was cancelled before a job was created
    Cancelled {
        /// Identifiers accumulated before cancellation
        fetched: u64,
    },
    /// The poll budget ran out; the job may still finish server-side
    TimedOut {
        /// Backend job identifier
        export_id: ExportId,
        /// Number of status queries made
        attempts: u32,
    },
    /// The attempt failed
    Failed {
        /// Human-readable failure description
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(ProgressSnapshot::new(1, 3).percentage, 33);
        assert_eq!(ProgressSnapshot::new(2, 3).percentage, 67);
        assert_eq!(ProgressSnapshot::new(150, 150).percentage, 100);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(ProgressSnapshot::new(42, 0).percentage, 0);
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let back: JobStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(back, JobStatus::Completed);
    }

    #[test]
    fn test_event_serde_tagged() {
        let event = ExportEvent::NothingToExport {
            attempt: AttemptId(7),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"nothing_to_export\""));
    }
}
