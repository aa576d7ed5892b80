//! Retry policy for the fetch phase
//!
//! A small explicit policy (max attempts, exponential backoff) that
//! wraps only the network call. Retries are owned here, not by the
//! API client: clients perform single-shot requests and report
//! classified errors.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff multiplier cap (2^6 = 64x the base delay)
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Bounded exponential-backoff retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    max_attempts: u32,
    /// Base delay, doubled for each subsequent retry
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }

    /// Delay before retry number `retry` (0-based), doubling and capped
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * (1u32 << retry.min(MAX_BACKOFF_SHIFT))
    }

    /// Run `operation` until it succeeds, a non-retryable error occurs,
    /// or the attempt budget is exhausted.
    ///
    /// Only errors for which [`Error::is_retryable`] holds (rate limits
    /// and transient connectivity failures) are retried; anything else
    /// is returned immediately.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error: Option<Error> = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.delay_for(attempt - 2);
                debug!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        "attempt failed, will retry"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(
                            operation = operation_name,
                            attempts = self.max_attempts,
                            error = %e,
                            "attempts exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }

        // Unreachable: the loop always returns.
        Err(last_error.unwrap_or_else(|| Error::Other("retry loop exited early".to_string())))
    }
}
