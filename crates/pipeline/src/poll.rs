//! Status polling for queued generation requests.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use signage_core::generation::MIN_POLL_INTERVAL;
use tokio_util::sync::CancellationToken;

use crate::backend::GenerationBackend;

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The request completed; carries the result document.
    Completed(serde_json::Value),
    /// The request finished unsuccessfully, or its result could not be
    /// fetched.
    Failed(String),
    /// `timeout` elapsed before the request finished.
    TimedOut,
    /// The cancellation token fired.
    Cancelled,
}

/// Check the status of `request_id` every `interval` until it finishes.
///
/// The first check happens one `interval` after the call. An interval
/// below [`MIN_POLL_INTERVAL`] is raised to it. A failed status check is
/// logged and retried on the next tick; only the deadline or the token end
/// the loop early.
pub async fn poll_until_terminal<B: GenerationBackend>(
    backend: &B,
    model: &str,
    request_id: &str,
    interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
) -> PollOutcome {
    let interval = interval.max(MIN_POLL_INTERVAL);
    let deadline = Instant::now() + timeout;
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut checks: u32 = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(%request_id, checks, "Polling cancelled");
                return PollOutcome::Cancelled;
            }
            _ = tokio::time::sleep_until(deadline) => {
                tracing::warn!(%request_id, checks, "Polling timed out");
                return PollOutcome::TimedOut;
            }
            _ = ticker.tick() => {
                checks += 1;
                let status = match backend.status(model, request_id).await {
                    Ok(status) => status,
                    Err(e) => {
                        tracing::warn!(%request_id, error = %e, "Status check failed, retrying");
                        continue;
                    }
                };

                if !status.is_completed() {
                    tracing::debug!(
                        %request_id,
                        state = ?status.status,
                        queue_position = ?status.queue_position,
                        "Generation still running",
                    );
                    continue;
                }

                if let Some(error) = status.error {
                    return PollOutcome::Failed(error);
                }

                return match backend.result(model, request_id).await {
                    Ok(result) => PollOutcome::Completed(result),
                    Err(e) => PollOutcome::Failed(format!("Failed to fetch result: {e}")),
                };
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
