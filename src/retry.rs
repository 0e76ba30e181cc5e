//! Retry logic with linear backoff and cancellable waits
//!
//! This module provides configurable retry logic for transient fetch failures.
//! Waiting between attempts goes through an injected [`Sleeper`], and every wait is
//! raced against a [`CancellationToken`], so a deadline that fires mid-backoff aborts
//! the operation immediately instead of sleeping out the full delay.
//!
//! # Example
//!
//! ```no_run
//! use disposable_domains::retry::{Cancelled, IsRetryable, TokioSleeper, retry_with_backoff};
//! use disposable_domains::config::RetryConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Cancelled,
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
//! impl From<Cancelled> for MyError {
//!     fn from(_: Cancelled) -> Self {
//!         MyError::Cancelled
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let cancel = CancellationToken::new();
//! retry_with_backoff(&config, &TokioSleeper, &cancel, |_attempt| async {
//!     Ok::<_, MyError>(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (bad status, connection reset, oversized body) should return `true`.
/// Permanent failures (unparsable URL, cancellation) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // Upstream lists are flaky; any non-2xx may recover on the next attempt
            FetchError::Status { .. } => true,
            FetchError::Transport(_) => true,
            FetchError::BodyTooLarge { .. } => true,
            FetchError::InvalidUrl { .. } => false,
            FetchError::Cancelled => false,
        }
    }
}

/// Marker returned when a wait was interrupted by cancellation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

impl From<Cancelled> for FetchError {
    fn from(_: Cancelled) -> Self {
        FetchError::Cancelled
    }
}

/// Source of backoff waits
///
/// Production code uses [`TokioSleeper`]; tests inject sleepers that return
/// immediately (recording the requested delay) or never return at all.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wait for `duration`, returning early with [`Cancelled`] if `cancel` fires first
pub async fn cancellable_sleep(
    sleeper: &dyn Sleeper,
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        _ = sleeper.sleep(duration) => Ok(()),
    }
}

/// Backoff delay after failed attempt `attempt` (1-indexed), before jitter
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    config
        .backoff_step
        .saturating_mul(attempt)
        .min(config.max_delay)
}

/// Execute an async operation with linear backoff retry logic
///
/// `operation` receives the 1-indexed attempt number. At most `config.max_attempts`
/// attempts are made (at least one). Non-retryable errors are returned immediately.
/// Between attempts the function waits [`backoff_delay`] through `sleeper`; if
/// `cancel` fires during that wait the cancellation error is returned instead.
///
/// # Returns
///
/// Returns the successful result or the last error after all attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    sleeper: &dyn Sleeper,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + From<Cancelled> + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = backoff_delay(config, attempt);
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
                    "Operation failed, retrying"
                );

                cancellable_sleep(sleeper, delay, cancel).await?;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::warn!(
                        error = %e,
                        attempts = attempt,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Permanent,
        Cancelled,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
                TestError::Cancelled => write!(f, "cancelled"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    impl From<Cancelled> for TestError {
        fn from(_: Cancelled) -> Self {
            TestError::Cancelled
        }
    }

    /// Returns immediately and remembers every requested delay
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    /// Never finishes a wait
    struct StuckSleeper;

    #[async_trait::async_trait]
    impl Sleeper for StuckSleeper {
        async fn sleep(&self, _duration: Duration) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn test_success_no_retry() {
        let sleeper = RecordingSleeper::default();
        let counter = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(
            &RetryConfig::default(),
            &sleeper,
            &CancellationToken::new(),
            |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(42)
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_retry_transient_then_succeed() {
        let sleeper = RecordingSleeper::default();
        let counter = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(
            &RetryConfig::default(),
            &sleeper,
            &CancellationToken::new(),
            |_| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(7)
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn test_retry_exhausted_returns_last_error() {
        let sleeper = RecordingSleeper::default();
        let attempts = Arc::new(Mutex::new(Vec::new()));

        let result = retry_with_backoff(
            &RetryConfig::default(),
            &sleeper,
            &CancellationToken::new(),
            |attempt| {
                let attempts = attempts.clone();
                async move {
                    attempts.lock().unwrap().push(attempt);
                    Err::<i32, _>(TestError::Transient)
                }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), TestError::Transient);
        assert_eq!(*attempts.lock().unwrap(), vec![1, 2, 3]);
        // No wait after the final attempt
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_no_retry() {
        let sleeper = RecordingSleeper::default();
        let counter = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(
            &RetryConfig::default(),
            &sleeper,
            &CancellationToken::new(),
            |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(TestError::Permanent)
                }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), TestError::Permanent);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_backoff_aborts_immediately() {
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));

        let op_cancel = cancel.clone();
        let result = retry_with_backoff(&RetryConfig::default(), &StuckSleeper, &cancel, |_| {
            let counter = counter.clone();
            let cancel = op_cancel.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                // Deadline fires while the first attempt is failing
                cancel.cancel();
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), TestError::Cancelled);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "no attempt after cancel");
    }

    #[tokio::test]
    async fn cancellable_sleep_completes_when_not_cancelled() {
        let sleeper = RecordingSleeper::default();
        let cancel = CancellationToken::new();
        cancellable_sleep(&sleeper, Duration::from_millis(3), &cancel)
            .await
            .unwrap();
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(3)]);
    }

    #[tokio::test]
    async fn cancellable_sleep_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = cancellable_sleep(&StuckSleeper, Duration::from_secs(60), &cancel).await;
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test]
    async fn tokio_sleeper_waits_out_the_delay() {
        let start = std::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn backoff_is_linear_and_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            backoff_step: Duration::from_millis(500),
            max_delay: Duration::from_millis(1200),
            jitter: false,
        };
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn jitter_stretches_recorded_delay_within_bounds() {
        let config = RetryConfig {
            jitter: true,
            max_attempts: 2,
            ..RetryConfig::default()
        };
        let sleeper = RecordingSleeper::default();

        let _ = retry_with_backoff(&config, &sleeper, &CancellationToken::new(), |_| async {
            Err::<i32, _>(TestError::Transient)
        })
        .await;

        let delays = sleeper.delays();
        assert_eq!(delays.len(), 1);
        assert!(delays[0] >= Duration::from_millis(500));
        assert!(delays[0] <= Duration::from_millis(1000));
    }

    #[test]
    fn add_jitter_on_zero_delay_returns_zero() {
        assert_eq!(add_jitter(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn fetch_error_retryability() {
        assert!(FetchError::Status { status: 500 }.is_retryable());
        assert!(FetchError::Status { status: 404 }.is_retryable());
        assert!(FetchError::BodyTooLarge { limit: 1 }.is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
        assert!(
            !FetchError::InvalidUrl {
                url: "nope".to_string(),
                reason: "relative URL without a base".to_string(),
            }
            .is_retryable()
        );
    }
}
