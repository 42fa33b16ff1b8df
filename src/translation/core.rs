/*!
 * Resilience composition around a backend's core call.
 *
 * Every single-text translation goes through the same steps in the same
 * order:
 *
 * 1. cache lookup, returning immediately on a hit
 * 2. rate limiter acquire, which may suspend
 * 3. retry-wrapped call to `perform_translation`
 * 4. cache store of the fresh response
 *
 * Cache lookups precede the rate limiter so repeated identical requests never
 * consume rate-limit budget.
 */

use log::{debug, warn};
use std::time::Duration;
use tokio::time::Instant;

use crate::app_config::{BackendConfig, CacheConfig};
use crate::errors::TranslationError;
use crate::translation::backend::{BackendMetadata, CostEstimate, TranslationBackend, TranslationRequest, TranslationResponse};
use crate::translation::cache::{CacheKey, TtlCache};
use crate::translation::rate_limiter::RateLimiter;
use crate::translation::retry::{Attempted, LogRetryObserver, RetryPolicy};

/// Response cache used by every backend
pub type TranslationCache = TtlCache<CacheKey, TranslationResponse>;

/// Characters per token used for estimates
const CHARS_PER_TOKEN: u64 = 4;

/// Cache, rate limiter and retry policy owned by one backend instance
#[derive(Debug, Clone)]
pub struct Resilience {
    pub cache: TranslationCache,
    /// `None` disables client-side rate limiting
    pub limiter: Option<RateLimiter>,
    pub retry: RetryPolicy,
}

impl Resilience {
    pub fn new(cache: TranslationCache, limiter: Option<RateLimiter>, retry: RetryPolicy) -> Self {
        Self { cache, limiter, retry }
    }

    /// Build the resilience layer a backend configuration asks for
    pub fn from_config(config: &BackendConfig, cache: &CacheConfig) -> Result<Self, TranslationError> {
        let cache = TranslationCache::new(cache.capacity, cache.ttl())?;
        let limiter = config.rate_limit().map(RateLimiter::per_minute).transpose()?;
        let retry = RetryPolicy::exponential(config.retry_count() + 1, config.retry_backoff())?;
        Ok(Self { cache, limiter, retry })
    }
}

/// Estimate tokens as one per four characters, rounded up
pub fn estimate_cost(metadata: &BackendMetadata, text: &str) -> CostEstimate {
    let chars = text.chars().count() as u64;
    let tokens = chars.div_ceil(CHARS_PER_TOKEN);
    CostEstimate {
        tokens,
        cost: tokens as f64 * metadata.cost_per_token,
    }
}

fn cache_key(request: &TranslationRequest) -> CacheKey {
    CacheKey::new(&request.text, &request.source_language, &request.target_language)
        .with_context(request.context.as_deref())
        .with_content_class(request.content_class)
}

/// Check a request before anything else happens
fn validate_request<B>(backend: &B, request: &TranslationRequest) -> Result<(), TranslationError>
where
    B: TranslationBackend + ?Sized,
{
    if request.text.trim().is_empty() {
        return Err(TranslationError::Validation("Text to translate must not be empty".to_string()));
    }
    let metadata = backend.metadata();
    if let Some(content_class) = request.content_class {
        metadata.check_content_class(content_class)?;
    }
    metadata.check_languages(&request.source_language, &request.target_language)
}

/// Translate one text, returning the response or error together with the
/// number of remote attempts it took. Cache hits and requests rejected before
/// any remote call report zero attempts.
pub async fn translate_attempted<B>(
    backend: &B,
    request: &TranslationRequest,
) -> Result<Attempted<TranslationResponse>, Attempted<TranslationError>>
where
    B: TranslationBackend + ?Sized,
{
    if let Err(error) = validate_request(backend, request) {
        return Err(Attempted { value: error, attempts: 0 });
    }

    let resilience = backend.resilience();
    let key = cache_key(request);
    if let Some(cached) = resilience.cache.get(&key) {
        debug!("Cache hit for {} -> {}", request.source_language, request.target_language);
        return Ok(Attempted { value: cached, attempts: 0 });
    }

    if let Some(limiter) = &resilience.limiter {
        limiter.acquire().await;
    }

    let metadata = backend.metadata();
    let observer = LogRetryObserver::new(metadata.name.clone());
    let started = Instant::now();
    let mut attempted = resilience
        .retry
        .run(
            move || async move {
                let response = backend.perform_translation(request).await?;
                if response.translated_text.trim().is_empty() {
                    return Err(TranslationError::Api {
                        status: None,
                        message: "Backend returned an empty translation".to_string(),
                    });
                }
                Ok::<_, TranslationError>(response)
            },
            TranslationError::is_retryable,
            &observer,
        )
        .await?;

    let response = &mut attempted.value;
    if response.meta.processing_time == Duration::ZERO {
        response.meta.processing_time = started.elapsed();
    }
    if response.meta.quality_score.is_none() {
        response.meta.quality_score = Some(metadata.quality_score);
    }
    if response.cost.is_none() {
        response.cost = response.token_usage.map(|usage| usage.total as f64 * metadata.cost_per_token);
    }

    if let Err(e) = resilience.cache.set(key, response.clone()) {
        warn!("Failed to cache translation: {}", e);
    }

    Ok(attempted)
}

/// Translate one text, propagating the last error once retries are exhausted
pub async fn translate<B>(backend: &B, request: &TranslationRequest) -> Result<TranslationResponse, TranslationError>
where
    B: TranslationBackend + ?Sized,
{
    translate_attempted(backend, request)
        .await
        .map(|ok| ok.value)
        .map_err(|err| err.value)
}
