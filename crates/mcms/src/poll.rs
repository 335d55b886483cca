//! Cancellation and polling helpers for chain-facing operations.

use crate::McmsError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{future::Future, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const INITIAL_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: usize = 20;

/// Backoff settings used while waiting for timelock operations to become ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PollOptions {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Number of checks before giving up, the first one included.
    pub max_attempts: usize,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self { initial_delay: INITIAL_DELAY, max_delay: MAX_DELAY, max_attempts: MAX_ATTEMPTS }
    }
}

/// Runs `fut` unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, McmsError>
where
    F: Future<Output = Result<T, McmsError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(McmsError::Cancelled),
        result = fut => result,
    }
}

fn compute_delay(options: &PollOptions, attempt: usize) -> Duration {
    let base_delay = options.initial_delay.saturating_mul(1 << attempt.min(10));
    let capped_delay = base_delay.min(options.max_delay);
    let jitter_ms = rand::thread_rng().gen_range(0..=capped_delay.as_millis() as u64 / 4);
    capped_delay + Duration::from_millis(jitter_ms)
}

const fn is_retryable(err: &McmsError) -> bool {
    matches!(err, McmsError::OperationNotReady { .. })
}

/// Calls `check` until it succeeds, backing off between attempts.
///
/// Only "not ready" failures are retried; any other error is returned as is.
pub async fn poll_until<F, Fut>(
    operation_name: &str,
    options: &PollOptions,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<(), McmsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), McmsError>>,
{
    let mut attempt = 0;

    loop {
        match cancellable(cancel, check()).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                if !is_retryable(&err) {
                    debug!(operation = %operation_name, error = %err, "Non-retryable error, not polling");
                    return Err(err);
                }

                attempt += 1;
                if attempt >= options.max_attempts {
                    warn!(
                        operation = %operation_name,
                        attempts = %attempt,
                        error = %err,
                        "Max poll attempts exceeded"
                    );
                    return Err(McmsError::PollExhausted { attempts: attempt, source: Box::new(err) });
                }

                let delay = compute_delay(options, attempt - 1);
                warn!(
                    operation = %operation_name,
                    attempt = %attempt,
                    max_attempts = %options.max_attempts,
                    delay_ms = %delay.as_millis(),
                    error = %err,
                    "Not ready yet, polling again"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(McmsError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
