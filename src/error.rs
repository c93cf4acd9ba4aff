//! Error types for bulk-export
//!
//! This module provides error handling for the library, including:
//! - Local validation errors (rejected before any network call)
//! - Network/transport errors from the HTTP layer
//! - Backend-reported failures with context (entity kind, record count)
//! - The distinct poll-timeout condition, which is not a job failure
//!
//! Cancellation is deliberately not an error: a cancelled scan flows through
//! the success-shaped [`ScanResult`](crate::scanner::ScanResult) path.

use crate::types::ExportId;
use thiserror::Error;

/// Result type alias for bulk-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bulk-export
///
/// Each variant carries the context needed to render the failure without
/// inspecting its source chain.
#[derive(Debug, Error)]
pub enum Error {
    /// Local validation failure; no network call was attempted
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description of the rejected input
        message: String,
    },

    /// Network or transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend returned a non-success HTTP status
    #[error("backend error ({status}): {message}")]
    Backend {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body or status description
        message: String,
    },

    /// Export job creation failed
    ///
    /// Terminal for the attempt, creation is never retried. The entity kind
    /// and attempted count are carried for diagnostic context.
    #[error("failed to create {entity} export for {count} records: {source}")]
    Creation {
        /// Kind of record being exported (e.g. "contact", "company")
        entity: String,
        /// Number of identifiers that were submitted
        count: usize,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Poll attempt budget exhausted without a terminal job status
    ///
    /// Distinct from [`Error::JobFailed`]: the job may still complete
    /// server-side after the client stops watching.
    #[error("export {export_id} still not terminal after {attempts} status checks")]
    PollTimeout {
        /// The job that was being watched
        export_id: ExportId,
        /// Number of status queries made
        attempts: u32,
    },

    /// Backend explicitly reported the job as failed
    #[error("export {export_id} failed: {message}")]
    JobFailed {
        /// The failed job
        export_id: ExportId,
        /// Backend-provided failure message, verbatim
        message: String,
    },

    /// Download preconditions not met (missing or incomplete descriptor)
    ///
    /// A local validation error, distinct from a remote retrieval failure
    /// such as an expired token.
    #[error("export {export_id} has no usable download descriptor")]
    MissingDescriptor {
        /// The job whose artifact cannot be retrieved
        export_id: ExportId,
    },

    /// I/O error (artifact save)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Whether this error was rejected locally, before any network call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. } | Error::MissingDescriptor { .. }
        )
    }
}
