use std::future::Future;

use drivetree_core::DriveError;
use tracing::warn;

use super::backoff::Backoff;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for DriveError {
    fn is_retryable(&self) -> bool {
        DriveError::is_retryable(self)
    }
}

/// Runs remote calls with exponential backoff on transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryExecutor {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt + 1 >= self.max_attempts => {
                    warn!(
                        op = label,
                        attempts = self.max_attempts,
                        "giving up after retries: {err}"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        op = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Backoff::default())
    }
}
