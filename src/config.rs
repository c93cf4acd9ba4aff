//! Configuration types for bulk-export

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Backend connectivity configuration
///
/// Groups settings for reaching the export backend. Used as a nested
/// sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the export API (default: "http://localhost:8080")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token attached to every request (None = unauthenticated)
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Per-request timeout (default: 30 seconds)
    ///
    /// This is the transport-level ceiling; the poller's wall-clock bound is
    /// separate and configured in [`JobConfig`].
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Identifier scan configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Page size for identifier listing requests (default: 100)
    ///
    /// Fixed per scan, independent of the target total; the final page is
    /// shrunk to the remainder when a target is set.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Export job configuration (chunking and polling)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    /// Identifier count at or above which creation uses the backend's
    /// chunked endpoint instead of the direct one (default: 5000)
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,

    /// Fixed interval between status queries (default: 2 seconds)
    ///
    /// Intentionally not backed off: a fixed cadence gives a predictable
    /// worst-case wall-clock bound of `poll_interval * poll_max_attempts`.
    #[serde(default = "default_poll_interval", with = "duration_ms_serde")]
    pub poll_interval: Duration,

    /// Maximum number of status queries before giving up (default: 150)
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            chunk_threshold: default_chunk_threshold(),
            poll_interval: default_poll_interval(),
            poll_max_attempts: default_poll_max_attempts(),
        }
    }
}

/// Artifact download configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory artifacts are saved into (default: "./exports")
    ///
    /// Files are named deterministically from the job identifier.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

/// Main configuration for [`ExportOrchestrator`](crate::ExportOrchestrator)
///
/// Fields are organized into logical sub-configs:
/// - [`backend`](BackendConfig): base URL, auth, request timeout
/// - [`scan`](ScanConfig): identifier listing page size
/// - [`job`](JobConfig): chunk threshold, poll cadence and budget
/// - [`download`](DownloadConfig): artifact save directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Backend connectivity settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Identifier scan settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Job creation and polling settings
    #[serde(default)]
    pub job: JobConfig,

    /// Artifact download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Event broadcast channel capacity (default: 1000)
    ///
    /// A subscriber that falls further behind than this receives a
    /// `RecvError::Lagged` instead of the missed events.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            scan: ScanConfig::default(),
            job: JobConfig::default(),
            download: DownloadConfig::default(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_page_size() -> usize {
    100
}

fn default_chunk_threshold() -> usize {
    5000
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(2000)
}

fn default_poll_max_attempts() -> u32 {
    150
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_event_buffer_size() -> usize {
    1000
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds, for sub-second intervals)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
