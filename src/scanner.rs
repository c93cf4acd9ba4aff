//! Paginated identifier scanning with progress and cancellation.
//!
//! A scan pulls identifiers from a [`RecordSource`] in fixed-size pages
//! until a target count is reached or the source is exhausted. Cancellation
//! between pages is a success-shaped outcome (the partial accumulation is
//! returned, never discarded) while a failed page request aborts the whole
//! scan.

use crate::backend::RecordSource;
use crate::error::Result;
use crate::types::{FilterCriteria, ProgressSnapshot};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Parameters controlling a scan
#[derive(Clone, Copy, Debug)]
pub struct ScanOptions {
    /// Page size for listing requests (fixed per scan)
    pub page_size: usize,
    /// Stop once this many identifiers have been accumulated
    /// (None = scan until the source is exhausted)
    pub target_total: Option<u64>,
    /// Authoritative total for progress reporting when no target is set,
    /// obtained from a prerequisite count query
    pub known_total: Option<u64>,
}

/// Outcome of a scan
///
/// `cancelled` distinguishes a deliberately cut-short scan from a complete
/// one; both carry whatever was accumulated and neither is an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanResult {
    /// Identifiers in server-returned order, no duplicates
    pub ids: Vec<String>,
    /// Whether the scan stopped because the token was signalled
    pub cancelled: bool,
}

/// Repeatedly fetch identifier pages until the target is reached, the
/// source is exhausted, or the token is cancelled between pages.
///
/// The request offset advances by the page size actually *requested*, not
/// by the number of identifiers returned, so a short-paging server cannot
/// cause records to be skipped. A [`ProgressSnapshot`] is sent after every
/// page; the channel end being closed does not stop the scan.
pub async fn scan(
    source: &dyn RecordSource,
    criteria: &FilterCriteria,
    opts: ScanOptions,
    cancel: &CancellationToken,
    progress: Option<&UnboundedSender<ProgressSnapshot>>,
) -> Result<ScanResult> {
    let total = opts.target_total.or(opts.known_total).unwrap_or(0);
    let mut ids: Vec<String> = Vec::new();
    let mut offset = 0usize;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(fetched = ids.len(), "scan cancelled, returning partial result");
            return Ok(ScanResult {
                ids,
                cancelled: true,
            });
        }

        let limit = match opts.target_total {
            Some(target) => {
                let remaining = target.saturating_sub(ids.len() as u64);
                if remaining == 0 {
                    break;
                }
                opts.page_size.min(remaining as usize)
            }
            None => opts.page_size,
        };

        let page = source.list_ids(criteria, offset, limit).await?;
        let returned = page.ids.len();
        ids.extend(page.ids);
        // Advance by the requested size so a short page never skips records
        offset += limit;

        if let Some(tx) = progress {
            tx.send(ProgressSnapshot::new(ids.len() as u64, total)).ok();
        }

        tracing::trace!(
            fetched = ids.len(),
            requested = limit,
            returned,
            "scan page complete"
        );

        if returned < limit || page.is_last {
            break;
        }
    }

    Ok(ScanResult {
        ids,
        cancelled: false,
    })
}
