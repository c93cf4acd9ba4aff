//! Selection-mode resolution into a concrete identifier list.
//!
//! The two local modes return what the caller already holds; the two
//! filter-driven modes delegate to the [`scanner`](crate::scanner). An empty
//! resolution is not an error here; the orchestrator surfaces it as a
//! "nothing to export" outcome.

use crate::backend::RecordSource;
use crate::error::{Error, Result};
use crate::scanner::{self, ScanOptions};
use crate::types::{FilterCriteria, ProgressSnapshot, SelectionMode};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Caller-held state a resolution draws from
#[derive(Clone, Debug, Default)]
pub struct ResolveContext {
    /// Explicitly pre-selected identifiers (for [`SelectionMode::Selected`])
    pub selected_ids: Vec<String>,
    /// Identifiers on the currently visible page
    /// (for [`SelectionMode::CurrentPage`])
    pub page_ids: Vec<String>,
    /// Active filter criteria (for the filter-driven modes)
    pub criteria: FilterCriteria,
}

/// A resolved identifier list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedIds {
    /// Identifiers in stable order
    pub ids: Vec<String>,
    /// Whether resolution was cut short by cancellation
    pub cancelled: bool,
}

/// Resolve a selection mode into a concrete, length-bounded identifier list.
///
/// `Selected` and `CurrentPage` return the corresponding context list
/// verbatim without any network call. `FirstN` validates the count before
/// touching the network, then scans with that target. `All` obtains the
/// authoritative total first so progress has a denominator; a failing count
/// query propagates without attempting the scan, and a zero count returns
/// empty without scanning.
pub async fn resolve(
    source: &dyn RecordSource,
    mode: &SelectionMode,
    ctx: &ResolveContext,
    page_size: usize,
    cancel: &CancellationToken,
    progress: Option<&UnboundedSender<ProgressSnapshot>>,
) -> Result<ResolvedIds> {
    match mode {
        SelectionMode::Selected => Ok(ResolvedIds {
            ids: ctx.selected_ids.clone(),
            cancelled: false,
        }),

        SelectionMode::CurrentPage => Ok(ResolvedIds {
            ids: ctx.page_ids.clone(),
            cancelled: false,
        }),

        SelectionMode::FirstN { count } => {
            if *count <= 0 {
                return Err(Error::validation(format!(
                    "requested record count must be positive, got {count}"
                )));
            }

            let result = scanner::scan(
                source,
                &ctx.criteria,
                ScanOptions {
                    page_size,
                    target_total: Some(*count as u64),
                    known_total: None,
                },
                cancel,
                progress,
            )
            .await?;

            Ok(ResolvedIds {
                ids: result.ids,
                cancelled: result.cancelled,
            })
        }

        SelectionMode::All => {
            let total = source.count(&ctx.criteria).await?;
            tracing::debug!(total, "matching record count obtained");

            if total == 0 {
                return Ok(ResolvedIds {
                    ids: Vec::new(),
                    cancelled: false,
                });
            }

            let result = scanner::scan(
                source,
                &ctx.criteria,
                ScanOptions {
                    page_size,
                    target_total: None,
                    known_total: Some(total),
                },
                cancel,
                progress,
            )
            .await?;

            Ok(ResolvedIds {
                ids: result.ids,
                cancelled: result.cancelled,
            })
        }
    }
}
