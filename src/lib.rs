//! # bulk-export
//!
//! Client-side orchestration library for bulk record export pipelines.
//!
//! Given a selection strategy over a large, filterable record set, the
//! orchestrator resolves a concrete identifier list, submits it to a backend
//! export pipeline (directly or via the backend's chunked path, depending on
//! size), polls the resulting background job to a terminal state, and
//! downloads the produced artifact.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to structured progress events;
//!   presentation is entirely the embedder's concern
//! - **Explicit cancellation** - Cancellability is visible in signatures as
//!   a threaded token, never ambient state
//! - **Structured outcomes** - Every failure mode is data, so a presentation
//!   layer renders them without a catch-all handler
//!
//! ## Quick Start
//!
//! ```no_run
//! use bulk_export::{Config, ExportOrchestrator, ExportRequest, FilterCriteria, SelectionMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.backend.base_url = "https://api.example.com".to_string();
//!     config.backend.auth_token = Some("token".to_string());
//!
//!     let orchestrator = ExportOrchestrator::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let outcome = orchestrator
//!         .run_export(ExportRequest::filtered(
//!             "contact",
//!             SelectionMode::FirstN { count: 150 },
//!             FilterCriteria::empty(),
//!         ))
//!         .await;
//!     println!("Outcome: {:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Backend access traits and the HTTP implementation
pub mod backend;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Export orchestration (decomposed into focused submodules)
pub mod orchestrator;
/// Selection-mode resolution
pub mod resolver;
/// Paginated identifier scanning
pub mod scanner;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use backend::{ExportBackend, HttpBackend, IdPage, RecordSource, StatusSnapshot};
pub use config::{BackendConfig, Config, DownloadConfig, JobConfig, ScanConfig};
pub use error::{Error, Result};
pub use orchestrator::{ExportOrchestrator, ExportRequest};
pub use resolver::{ResolveContext, ResolvedIds};
pub use scanner::{ScanOptions, ScanResult};
pub use types::{
    AttemptId, CreationStrategy, DownloadDescriptor, ExportEvent, ExportId, ExportJob,
    ExportOutcome, ExportPhase, FilterCriteria, JobStatus, ProgressSnapshot, SelectionMode,
};
