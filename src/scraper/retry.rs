//! Retry logic with exponential backoff
//!
//! Transient failures are retried with a delay of
//! `backoff_base * 2^(attempt - 1)` until either the attempt limit or the
//! elapsed-time limit is reached, whichever comes first.

use crate::FetchError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Retry bounds for a single page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub backoff_base: Duration,

    /// Retrying stops once this much time has passed since the first attempt
    pub max_elapsed_time: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            backoff_base: Duration::from_secs(1),
            max_elapsed_time: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Uncapped delay following failed attempt number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.backoff_base.checked_mul(factor))
            .unwrap_or(self.max_elapsed_time)
    }

    /// Decides whether to retry after failed attempt `attempt`
    ///
    /// Returns the delay to wait, truncated so it never runs past the
    /// elapsed-time limit, or `None` when retrying must stop.
    pub fn next_delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        if attempt >= self.max_attempts || elapsed >= self.max_elapsed_time {
            return None;
        }

        let remaining = self.max_elapsed_time - elapsed;
        Some(self.backoff_delay(attempt).min(remaining))
    }
}

/// A fetch that failed for good
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {last}")]
pub struct RetryError {
    /// Attempts made before giving up
    pub attempts: u32,

    /// The error from the final attempt
    pub last: FetchError,
}

/// Runs `operation` until it succeeds, fails permanently, or the policy is spent
///
/// The operation receives the 1-based attempt number. Only errors for which
/// [`FetchError::is_retryable`] holds are retried.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let started = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(url, attempts = attempt, "Fetch succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            return Err(RetryError {
                attempts: attempt,
                last: error,
            });
        }

        let Some(delay) = policy.next_delay(attempt, started.elapsed()) else {
            return Err(RetryError {
                attempts: attempt,
                last: error,
            });
        };

        tracing::warn!(
            url,
            error = %error,
            attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Fetch failed, retrying"
        );

        tokio::time::sleep(delay).await;
    }
}
