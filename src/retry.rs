//! Bounded exponential backoff for transient external-service failures.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Retry policy for calls to external services.
///
/// Transient failures (rate limits, timeouts, server errors) are retried up
/// to `max_attempts` total attempts, sleeping `initial_backoff * 2^n` between
/// attempts, capped at `max_backoff`. Non-transient failures surface
/// immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts (the first call counts as one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// The backoff delay after the given zero-based attempt.
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }
}

/// Run `op`, retrying per `policy` while `is_transient` classifies the
/// failure as retryable.
///
/// Returns the first success, the first non-transient error, or the last
/// transient error once attempts are exhausted. A `max_attempts` of zero is
/// treated as one attempt.
pub async fn with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        debug!(what, attempt = attempt + 1, max = attempts, "attempting call");

        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if is_transient(&error) && attempt + 1 < attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    what,
                    attempt = attempt + 1,
                    max = attempts,
                    error = %error,
                    ?delay,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                if is_transient(&error) {
                    warn!(what, error = %error, "transient failure, attempts exhausted");
                } else {
                    warn!(what, error = %error, "non-retryable failure");
                }
                return Err(error);
            }
        }
    }
}
