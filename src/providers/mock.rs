/*!
 * Mock backend implementations for testing and dry runs.
 *
 * This module provides an in-process backend with scripted behavior:
 * - `MockBackend::identity()` - Returns the source text unchanged
 * - `MockBackend::prefixed(p)` - Returns the source text with a prefix
 * - `MockBackend::failing_on(t, e)` - Fails whenever the text equals `t`
 * - `MockBackend::failing(e)` - Always fails with an error
 *
 * Every remote-equivalent call is counted and recorded so tests can assert
 * on what actually reached the backend.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::app_config::BackendConfig;
use crate::errors::TranslationError;
use crate::resource::ContentClass;
use crate::translation::backend::{
    BackendMetadata, LanguageSupport, TokenUsage, TranslationBackend, TranslationRequest, TranslationResponse,
};
use crate::translation::cache::TtlCache;
use crate::translation::core::Resilience;
use crate::translation::rate_limiter::RateLimiter;
use crate::translation::retry::RetryPolicy;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Return the source text unchanged
    Identity,
    /// Return the source text with a prefix
    Prefix(String),
    /// Fail with `error` whenever the request text equals `text`
    FailOn { text: String, error: TranslationError },
    /// Fail every Nth request (1-based) with a retryable error
    Intermittent { fail_every: usize },
    /// Always fail with the given error
    Failing(TranslationError),
    /// Identity after a delay
    Slow { delay_ms: u64 },
}

/// Scripted backend
#[derive(Debug)]
pub struct MockBackend {
    behavior: MockBehavior,
    config: BackendConfig,
    metadata: BackendMetadata,
    resilience: Resilience,
    /// Number of `perform_translation` calls
    request_count: Arc<AtomicUsize>,
    /// Requests in arrival order
    requests: Arc<Mutex<Vec<TranslationRequest>>>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            config: BackendConfig::default(),
            metadata: Self::default_metadata(),
            resilience: Self::default_resilience(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self::new(MockBehavior::Prefix(prefix.into()))
    }

    pub fn failing_on(text: impl Into<String>, error: TranslationError) -> Self {
        Self::new(MockBehavior::FailOn { text: text.into(), error })
    }

    pub fn failing(error: TranslationError) -> Self {
        Self::new(MockBehavior::Failing(error))
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    fn default_metadata() -> BackendMetadata {
        BackendMetadata {
            name: "Mock".to_string(),
            version: "1.0".to_string(),
            cost_per_token: 0.0,
            max_batch_size: 10,
            max_concurrent_requests: 4,
            quality_score: 0.5,
            supported_content_classes: ContentClass::ALL.to_vec(),
            supported_languages: LanguageSupport::Any,
            supports_adult_content: false,
        }
    }

    fn default_resilience() -> Resilience {
        let retry = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(100), 2.0).unwrap_or_default();
        Resilience::new(TtlCache::default(), None, retry)
    }

    /// Replace the static metadata
    pub fn with_metadata(mut self, metadata: BackendMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Declare adult-content support
    pub fn with_adult_content(mut self, supported: bool) -> Self {
        self.metadata.supports_adult_content = supported;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.metadata.max_batch_size = max_batch_size;
        self
    }

    pub fn with_cost_per_token(mut self, cost_per_token: f64) -> Self {
        self.metadata.cost_per_token = cost_per_token;
        self
    }

    pub fn with_languages(mut self, languages: LanguageSupport) -> Self {
        self.metadata.supported_languages = languages;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.resilience.limiter = Some(limiter);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.resilience.retry = retry;
        self
    }

    pub fn with_resilience(mut self, resilience: Resilience) -> Self {
        self.resilience = resilience;
        self
    }

    pub fn with_config(mut self, config: BackendConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the number of `perform_translation` calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the call counter
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<TranslationRequest> {
        self.requests.lock().clone()
    }

    /// Reset the request counter and log
    pub fn reset(&self) {
        self.request_count.store(0, Ordering::SeqCst);
        self.requests.lock().clear();
    }

    fn usage_for(text: &str, translated: &str) -> TokenUsage {
        let tokens = |s: &str| (s.chars().count() as u64).div_ceil(4);
        TokenUsage::new(tokens(text), tokens(translated))
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn resilience(&self) -> &Resilience {
        &self.resilience
    }

    fn validate_config(&self) -> Result<(), TranslationError> {
        Ok(())
    }

    async fn perform_translation(&self, request: &TranslationRequest) -> Result<TranslationResponse, TranslationError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(request.clone());

        let translated = match &self.behavior {
            MockBehavior::Identity => request.text.clone(),
            MockBehavior::Prefix(prefix) => format!("{}{}", prefix, request.text),
            MockBehavior::FailOn { text, error } => {
                if &request.text == text {
                    return Err(error.clone());
                }
                request.text.clone()
            }
            MockBehavior::Intermittent { fail_every } => {
                if *fail_every > 0 && count % fail_every == 0 {
                    return Err(TranslationError::Api {
                        status: Some(503),
                        message: format!("Simulated failure on request {}", count),
                    });
                }
                request.text.clone()
            }
            MockBehavior::Failing(error) => return Err(error.clone()),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                request.text.clone()
            }
        };

        let usage = Self::usage_for(&request.text, &translated);
        Ok(TranslationResponse::new(translated).with_token_usage(usage))
    }
}
