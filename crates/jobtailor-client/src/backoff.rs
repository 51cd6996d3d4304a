//! Retry-with-backoff policy shared by the reader fetch and the chat
//! completion call: small, bounded, and cancellable — sized for an
//! interactive caller, not a background batch job.

use std::time::Duration;

use jobtailor_core::error::AppError;
use tokio_util::sync::CancellationToken;

const INITIAL_BACKOFF_MS: u64 = 500;
const BACKOFF_FACTOR: u64 = 5;
const MAX_BACKOFF_MS: u64 = 10_000;

/// Escalate the backoff delay after a throttling response.
///
/// Starts at 500 ms, multiplies by 5 per retry, and returns `None` once the
/// escalated delay would exceed the 10 s cap — at which point the caller
/// fails permanently with [`AppError::RateLimited`]. That gives at most two
/// waits (500 → 2500; 12 500 exceeds the cap) before giving up.
pub(crate) fn next_backoff(current_ms: u64) -> Option<u64> {
    let next = if current_ms == 0 {
        INITIAL_BACKOFF_MS
    } else {
        current_ms * BACKOFF_FACTOR
    };
    (next <= MAX_BACKOFF_MS).then_some(next)
}

/// Sleep for the backoff delay, aborting immediately if the caller's
/// cancellation fires mid-wait.
pub(crate) async fn wait(cancel: &CancellationToken, delay_ms: u64) -> Result<(), AppError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => Ok(()),
    }
}
