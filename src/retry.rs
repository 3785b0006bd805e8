use std::{future::Future, time::Duration};

use backoff::{backoff::Backoff, future::retry_notify};
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};

use crate::error::FetchExhaustedError;

#[serde_as]
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(rename = "initial_delay_ms")]
    #[serde_as(as = "DurationMilliSeconds")]
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn backoff(&self) -> DoublingBackoff {
        DoublingBackoff {
            initial_delay: self.initial_delay,
            max_attempts: self.attempts(),
            failures: 0,
        }
    }

    /// Delays slept between consecutive attempts when every attempt fails.
    pub fn schedule(&self) -> Vec<Duration> {
        let mut backoff = self.backoff();
        std::iter::from_fn(|| backoff.next_backoff()).collect()
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent.
    ///
    /// Every error is treated as transient: the operation is expected to turn non-success HTTP
    /// statuses into errors itself.
    pub async fn with_retry<T, F, Fut>(&self, source_name: &'static str, mut operation: F) -> Result<T, FetchExhaustedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempts = 0;
        let mut failures = 0;

        let result = retry_notify(
            self.backoff(),
            || {
                attempts += 1;
                let attempt = operation();
                async move { attempt.await.map_err(backoff::Error::transient) }
            },
            |err: anyhow::Error, delay: Duration| {
                failures += 1;
                tracing::warn!(
                    source = source_name,
                    attempt = failures,
                    ?delay,
                    error = %err,
                    "request failed, retrying"
                );
            },
        )
        .await;

        result.map_err(|last_error| {
            tracing::error!(source = source_name, attempts, error = %last_error, "retry budget exhausted");
            FetchExhaustedError {
                source_name,
                attempts,
                last_error,
            }
        })
    }
}

/// Doubles the delay after every failed attempt and gives up after `max_attempts` failures.
#[derive(Debug, Clone)]
pub struct DoublingBackoff {
    initial_delay: Duration,
    max_attempts: u32,
    failures: u32,
}

impl Backoff for DoublingBackoff {
    fn reset(&mut self) {
        self.failures = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.max_attempts {
            return None;
        }
        Some(
            self.initial_delay
                .saturating_mul(2u32.saturating_pow(self.failures - 1)),
        )
    }
}
