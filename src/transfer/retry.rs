// src/transfer/retry.rs

//! Retry policy for downloads.
//!
//! The production policy is fixed: 5 attempts, waiting `2^k` seconds before
//! retry `k` (2s, 4s, 8s, 16s), no jitter and no cap. Every error is retried.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Maximum number of download attempts.
pub const DOWNLOAD_MAX_ATTEMPTS: u32 = 5;

/// Delay before a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Wait `unit * 2^k` before retry `k` (k >= 1).
    Exponential { unit: Duration },
    /// Retry immediately.
    None,
}

impl Backoff {
    /// Delay to wait before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Exponential { unit } => unit.saturating_mul(2u32.saturating_pow(retry)),
            Backoff::None => Duration::ZERO,
        }
    }
}

/// Value object describing how often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// The fixed download policy.
    pub fn download() -> Self {
        Self {
            max_attempts: DOWNLOAD_MAX_ATTEMPTS,
            backoff: Backoff::Exponential {
                unit: Duration::from_secs(1),
            },
        }
    }

    /// `max_attempts` attempts with no delay in between.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::None,
        }
    }

    /// Total time spent waiting if the first `failures` attempts fail.
    pub fn total_delay(&self, failures: u32) -> Duration {
        (1..=failures).map(|k| self.backoff.delay(k)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::download()
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// `op` receives the 1-based attempt number. Attempts are strictly
/// sequential; the wait uses `tokio::time::sleep` so the runtime keeps
/// serving other tasks. On exhaustion only the last error is returned.
///
/// A policy with `max_attempts == 0` still makes one attempt.
pub async fn retry_async<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                debug!(label, attempt, "attempt succeeded");
                return Ok(value);
            }
            Err(err) if attempt < max_attempts => {
                let delay = policy.backoff.delay(attempt);
                warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                warn!(label, attempt, error = %err, "final attempt failed");
                return Err(err);
            }
        }
    }
}
