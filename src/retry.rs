//! Retry logic with exponential backoff
//!
//! Only transient fetch failures (server errors, unreachable network, unclassified
//! statuses) are retried. Not-found, rate-limited and validation failures are
//! returned on first occurrence. Waits between attempts are `tokio::time::sleep`
//! calls, so other tasks keep running while a retry is pending.
//!
//! # Example
//!
//! ```no_run
//! use profile_card::retry::{IsRetryable, fetch_with_retry};
//! use profile_card::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let result = fetch_with_retry(&config, config.max_attempts, || async {
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, ErrorKind};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for ErrorKind {
    fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::ServerError | ErrorKind::NetworkUnreachable | ErrorKind::Unknown => true,
            // The upstream answered definitively; asking again changes nothing
            ErrorKind::NotFound | ErrorKind::RateLimited => false,
        }
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Fetch(e) => e.kind.is_retryable(),
            Error::Validation(_) | Error::Config { .. } | Error::Other(_) => false,
        }
    }
}

/// Run `operation` up to `max_attempts` times with exponential backoff
///
/// After failed attempt `n` the loop waits [`RetryConfig::delay_after`]`(n)`
/// (plus jitter when enabled) before attempt `n + 1`. A non-retryable error is
/// returned immediately. Once `max_attempts` attempts have failed the last
/// error is returned. A `max_attempts` of zero is treated as one.
pub async fn fetch_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = config.delay_after(attempt);
                let delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis(),
                    "Fetch failed, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Fetch failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Fetch failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay
///
/// The result is uniformly distributed between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
        .unwrap_or(Duration::MAX)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn failing(kind: ErrorKind) -> Error {
        FetchError::new(kind).into()
    }

    // Paused clocks advance straight to the next timer, modulo millisecond rounding
    fn assert_waited(elapsed: Duration, expected: Duration) {
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(10),
            "expected to wait {expected:?}, waited {elapsed:?}"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(failing(ErrorKind::ServerError).is_retryable());
        assert!(failing(ErrorKind::NetworkUnreachable).is_retryable());
        assert!(failing(ErrorKind::Unknown).is_retryable());
        assert!(!failing(ErrorKind::NotFound).is_retryable());
        assert!(!failing(ErrorKind::RateLimited).is_retryable());
        assert!(!Error::Validation("empty".into()).is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_no_retry() {
        let config = RetryConfig::default();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&config, 3, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_transient_then_succeed() {
        let config = RetryConfig::default();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let start = Instant::now();

        let result = fetch_with_retry(&config, 3, || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(failing(ErrorKind::ServerError))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_waited(start.elapsed(), Duration::from_secs(2 + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_waits_sum_of_powers_of_two() {
        let config = RetryConfig::default();

        for max_attempts in 1..=9u32 {
            let counter = Arc::new(AtomicU32::new(0));
            let counter_clone = counter.clone();
            let start = Instant::now();

            let result = fetch_with_retry(&config, max_attempts, || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(failing(ErrorKind::NetworkUnreachable))
                }
            })
            .await;

            let expected: u64 = (1..max_attempts).map(|n| 2u64.pow(n)).sum();
            assert_eq!(result.unwrap_err().kind(), Some(ErrorKind::NetworkUnreachable));
            assert_eq!(counter.load(Ordering::SeqCst), max_attempts);
            assert_waited(start.elapsed(), Duration::from_secs(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error() {
        let config = RetryConfig::default();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&config, 2, || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                let kind = if count == 0 {
                    ErrorKind::ServerError
                } else {
                    ErrorKind::Unknown
                };
                Err::<i32, _>(failing(kind))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), Some(ErrorKind::Unknown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_no_retry() {
        let config = RetryConfig::default();

        for kind in [ErrorKind::NotFound, ErrorKind::RateLimited] {
            let counter = Arc::new(AtomicU32::new(0));
            let counter_clone = counter.clone();
            let start = Instant::now();

            let result = fetch_with_retry(&config, 5, || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(failing(kind))
                }
            })
            .await;

            assert_eq!(result.unwrap_err().kind(), Some(kind));
            assert_eq!(counter.load(Ordering::SeqCst), 1, "should not retry {kind}");
            assert_waited(start.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let config = RetryConfig::default();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let _ = fetch_with_retry(&config, 0, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(failing(ErrorKind::ServerError))
            }
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_jitter_bounds() {
        let delay = Duration::from_millis(100);
        for _ in 0..20 {
            let jittered = add_jitter(delay);
            assert!(jittered >= delay);
            assert!(jittered <= delay * 2);
        }
    }
}
