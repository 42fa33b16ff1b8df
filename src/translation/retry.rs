/*!
 * Exponential backoff retry execution.
 *
 * The delay before retry `n` (1-based) is
 * `min(initial_delay * backoff_factor^(n-1), max_delay)`. Observers are
 * notified on every retry and on the final outcome; they cannot influence
 * control flow.
 */

use log::{debug, warn};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::errors::TranslationError;

/// Hooks fired by [`RetryPolicy::run`]
pub trait RetryObserver: Send + Sync {
    /// Called before sleeping ahead of another attempt
    fn on_retry(&self, _attempt: u32, _delay: Duration, _error: &dyn Display) {}

    /// Called once the operation succeeded
    fn on_success(&self, _attempts: u32) {}

    /// Called once the operation failed for good
    fn on_failure(&self, _attempts: u32, _error: &dyn Display) {}
}

/// Observer that reports through the `log` facade
#[derive(Debug, Clone)]
pub struct LogRetryObserver {
    label: String,
}

impl LogRetryObserver {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl RetryObserver for LogRetryObserver {
    fn on_retry(&self, attempt: u32, delay: Duration, error: &dyn Display) {
        warn!("{}: attempt {} failed ({}), retrying in {:?}", self.label, attempt, error, delay);
    }

    fn on_success(&self, attempts: u32) {
        if attempts > 1 {
            debug!("{}: succeeded after {} attempts", self.label, attempts);
        }
    }

    fn on_failure(&self, attempts: u32, error: &dyn Display) {
        warn!("{}: giving up after {} attempts: {}", self.label, attempts, error);
    }
}

/// Observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRetryObserver;

impl RetryObserver for NoopRetryObserver {}

/// A value or error together with the number of attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

impl<T> Attempted<T> {
    /// Number of retries, i.e. attempts after the first
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Retry parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
}

impl RetryPolicy {
    /// Create a policy; every parameter must be positive and `max_delay >= initial_delay`
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
    ) -> Result<Self, TranslationError> {
        if max_attempts == 0 {
            return Err(TranslationError::Config("Retry max_attempts must be positive".to_string()));
        }
        if initial_delay.is_zero() || max_delay.is_zero() {
            return Err(TranslationError::Config("Retry delays must be positive".to_string()));
        }
        if !(backoff_factor.is_finite() && backoff_factor > 0.0) {
            return Err(TranslationError::Config("Retry backoff_factor must be positive".to_string()));
        }
        if max_delay < initial_delay {
            return Err(TranslationError::Config(format!(
                "Retry max_delay ({:?}) must not be shorter than initial_delay ({:?})",
                max_delay, initial_delay
            )));
        }

        Ok(Self { max_attempts, initial_delay, max_delay, backoff_factor })
    }

    /// Policy with a doubling backoff starting at `backoff_base` and capped at 30s
    pub fn exponential(max_attempts: u32, backoff_base: Duration) -> Result<Self, TranslationError> {
        let max_delay = backoff_base.max(Duration::from_secs(30));
        Self::new(max_attempts, backoff_base, max_delay, 2.0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry following failed attempt `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.initial_delay.as_nanos() as f64 * self.backoff_factor.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(scaled.round() as u64)
    }

    /// Run `operation` until it succeeds, a non-retryable error occurs or the
    /// attempts are exhausted
    pub async fn run<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        is_retryable: P,
        observer: &dyn RetryObserver,
    ) -> Result<Attempted<T>, Attempted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    observer.on_success(attempt);
                    return Ok(Attempted { value, attempts: attempt });
                }
                Err(error) => {
                    if attempt >= self.max_attempts || !is_retryable(&error) {
                        observer.on_failure(attempt, &error);
                        return Err(Attempted { value: error, attempts: attempt });
                    }

                    let delay = self.delay_for_attempt(attempt);
                    observer.on_retry(attempt, delay, &error);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run `operation` treating every error as retryable, re-raising the last one
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run(operation, |_| true, &NoopRetryObserver)
            .await
            .map(|ok| ok.value)
            .map_err(|err| err.value)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}
