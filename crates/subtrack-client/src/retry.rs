//! Retry with exponential backoff, used when flushing the outbox.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Total attempts, including the first one.
    pub max_attempts: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::flush()
    }
}

impl RetryConfig {
    /// Quick retry for an interactive outbox flush: three attempts, then
    /// leave the record queued.
    #[must_use]
    pub fn flush() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
            max_attempts: 3,
        }
    }

    /// Single attempt, no waiting.
    #[must_use]
    pub fn once() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            factor: 1.0,
            max_attempts: 1,
        }
    }
}

pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(val) => {
                if attempts > 0 {
                    info!(operation = operation_name, retries = attempts, "succeeded after retry");
                }
                return Ok(val);
            }
            Err(err) => {
                attempts += 1;
                if attempts >= config.max_attempts.max(1) {
                    return Err(err);
                }

                warn!(
                    operation = operation_name,
                    attempt = attempts,
                    max_attempts = config.max_attempts,
                    error = %err,
                    next_in = ?delay,
                    "operation failed, retrying"
                );

                sleep(delay).await;
                delay = delay.mul_f64(config.factor).min(config.max_delay);
            }
        }
    }
}
