/*!
 * Token bucket rate limiting.
 *
 * Refill is lazy: every observation first credits `refill_rate` tokens per
 * whole `refill_interval` elapsed since the last refill, clamped to
 * `max_tokens`. No background timer is involved.
 */

use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::TranslationError;

/// Mutable bucket state
#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub tokens: u32,
    pub last_refill: Instant,
    pub max_tokens: u32,
    pub refill_rate: u32,
    pub refill_interval: Duration,
}

impl RateLimitState {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill);
        let intervals = elapsed.as_nanos() / self.refill_interval.as_nanos();
        let add = intervals.saturating_mul(u128::from(self.refill_rate));
        if add > 0 {
            let tokens = (u128::from(self.tokens) + add).min(u128::from(self.max_tokens));
            self.tokens = tokens as u32;
            self.last_refill = now;
        }
    }

    fn wait_time(&self, now: Instant) -> Duration {
        if self.tokens > 0 {
            return Duration::ZERO;
        }
        self.refill_interval.saturating_sub(now.duration_since(self.last_refill))
    }
}

/// Token bucket shared between all callers of one backend
#[derive(Debug, Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimitState>>,
}

impl RateLimiter {
    /// Create a full bucket.
    ///
    /// Fails when any parameter is zero or when `refill_rate` exceeds `max_tokens`.
    pub fn new(max_tokens: u32, refill_rate: u32, refill_interval: Duration) -> Result<Self, TranslationError> {
        if max_tokens == 0 {
            return Err(TranslationError::Config("Rate limiter max_tokens must be positive".to_string()));
        }
        if refill_rate == 0 {
            return Err(TranslationError::Config("Rate limiter refill_rate must be positive".to_string()));
        }
        if refill_interval.is_zero() {
            return Err(TranslationError::Config("Rate limiter refill_interval must be positive".to_string()));
        }
        if refill_rate > max_tokens {
            return Err(TranslationError::Config(format!(
                "Rate limiter refill_rate ({}) cannot exceed max_tokens ({})",
                refill_rate, max_tokens
            )));
        }

        Ok(Self {
            state: Arc::new(Mutex::new(RateLimitState {
                tokens: max_tokens,
                last_refill: Instant::now(),
                max_tokens,
                refill_rate,
                refill_interval,
            })),
        })
    }

    /// Limiter allowing `requests_per_minute` calls per minute, all available as a burst
    pub fn per_minute(requests_per_minute: u32) -> Result<Self, TranslationError> {
        Self::new(requests_per_minute, requests_per_minute, Duration::from_secs(60))
    }

    /// Take one token, sleeping until one is available
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let now = Instant::now();
                let mut state = self.state.lock();
                state.refill(now);
                if state.tokens > 0 {
                    state.tokens -= 1;
                    return;
                }
                state.wait_time(now)
            };

            debug!("Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Take one token if one is available right now
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        state.refill(Instant::now());
        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Whether a token is available, without consuming it
    pub fn can_acquire(&self) -> bool {
        let mut state = self.state.lock();
        state.refill(Instant::now());
        state.tokens > 0
    }

    /// Time until a token becomes available, zero if one is available now
    pub fn wait_time(&self) -> Duration {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.refill(now);
        state.wait_time(now)
    }

    /// Tokens currently in the bucket
    pub fn available_tokens(&self) -> u32 {
        let mut state = self.state.lock();
        state.refill(Instant::now());
        state.tokens
    }
}
