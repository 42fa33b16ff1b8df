/*!
 * Integration tests for single and batch translation through the
 * cache, rate limiter and retry stack
 */

use rpgmtl::errors::{ErrorKind, TranslationError};
use rpgmtl::providers::MockBackend;
use rpgmtl::resource::{ContentClass, TranslationUnit};
use rpgmtl::translation::{
    BatchOptions, LanguageSupport, RateLimiter, TranslationBackend, TranslationRequest,
};
use std::time::Duration;
use tokio_test::assert_ok;

use crate::common;

fn retryable() -> TranslationError {
    TranslationError::Api { status: Some(503), message: "overloaded".to_string() }
}

#[tokio::test(start_paused = true)]
async fn test_translate_withRepeatedRequest_shouldHitCacheBeforeRateLimiter() {
    common::init_logging();
    let limiter = RateLimiter::new(1, 1, Duration::from_secs(60)).unwrap();
    let backend = MockBackend::prefixed("EN:").with_rate_limiter(limiter.clone());
    let request = TranslationRequest::new("勇者", "ja", "en");

    let first = assert_ok!(backend.translate(&request).await);
    assert_eq!(first.translated_text, "EN:勇者");
    assert_eq!(limiter.available_tokens(), 0);

    let started = tokio::time::Instant::now();
    let second = assert_ok!(backend.translate(&request).await);
    assert_eq!(second.translated_text, "EN:勇者");
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(limiter.available_tokens(), 0);
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withDifferentContext_shouldNotShareCacheEntry() {
    let backend = MockBackend::identity();
    let base = TranslationRequest::new("光", "ja", "en");

    assert_ok!(backend.translate(&base.clone().with_context(Some("Character name".into()))).await);
    assert_ok!(backend.translate(&base.with_context(Some("Skill name".into()))).await);
    assert_eq!(backend.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withNonRetryableError_shouldFailAfterOneAttempt() {
    let backend = MockBackend::failing(TranslationError::Config("bad key".to_string()));

    let err = backend.translate(&TranslationRequest::new("こんにちは", "ja", "en")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withPersistentRetryableError_shouldExhaustAttempts() {
    let backend = MockBackend::failing(retryable());

    let err = backend.translate(&TranslationRequest::new("こんにちは", "ja", "en")).await.unwrap_err();
    assert_eq!(err, retryable());
    assert_eq!(backend.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withEmptyText_shouldFailValidationWithoutRemoteCall() {
    let backend = MockBackend::identity();

    let err = backend.translate(&TranslationRequest::new("  ", "ja", "en")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withFreshResponse_shouldFillMetaAndCost() {
    let backend = MockBackend::identity().with_cost_per_token(0.5);

    let response = assert_ok!(backend.translate(&TranslationRequest::new("abcdefgh", "ja", "en")).await);
    // 2 prompt tokens plus 2 completion tokens
    assert_eq!(response.token_usage.map(|u| u.total), Some(4));
    assert_eq!(response.cost, Some(2.0));
    assert_eq!(response.meta.quality_score, Some(0.5));
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withOneRetryableFailure_shouldKeepOtherResults() {
    common::init_logging();
    let units = common::numbered_units(5);
    let backend = MockBackend::failing_on("unit 3", retryable());

    let result = assert_ok!(backend.translate_batch(units, "ja", "en", &BatchOptions::default()).await);

    assert_eq!(result.stats.success_count, 4);
    assert_eq!(result.stats.failed_count, 1);
    assert_eq!(result.errors.len(), 1);

    let error = &result.errors[0];
    assert_eq!(error.unit.resource_id, "3");
    assert_eq!(error.text, "unit 3");
    assert_eq!(error.kind, ErrorKind::Api);
    assert_eq!(error.retry_count, 2);

    let targets: Vec<&str> = result.units.iter().map(|u| u.target.as_str()).collect();
    assert_eq!(targets, vec!["unit 1", "unit 2", "", "unit 4", "unit 5"]);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withSlowBackend_shouldPreserveInputOrder() {
    let units = common::numbered_units(12);
    let backend = MockBackend::slow(50).with_max_batch_size(5);

    let result = assert_ok!(backend.translate_batch(units.clone(), "ja", "en", &BatchOptions::default()).await);

    let ids: Vec<&str> = result.units.iter().map(|u| u.resource_id.as_str()).collect();
    let expected: Vec<&str> = units.iter().map(|u| u.resource_id.as_str()).collect();
    assert_eq!(ids, expected);
    assert!(result.units.iter().all(|u| u.target == u.source));
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withConcurrencyCap_shouldRunChunkInWaves() {
    let units = common::numbered_units(4);
    let backend = MockBackend::slow(100);
    let options = BatchOptions { max_concurrency: Some(2), ..BatchOptions::default() };

    let started = tokio::time::Instant::now();
    assert_ok!(backend.translate_batch(units, "ja", "en", &options).await);
    assert_eq!(started.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withAdultUnitsOnUnsupportedBackend_shouldFailBeforeAnyRequest() {
    let units = vec![
        TranslationUnit::new("1", "name", "A", "data/Actors.json"),
        TranslationUnit::new("1", "profile", "B", "data/Actors.json").with_content_class(ContentClass::Adult),
    ];
    let backend = MockBackend::identity();

    let err = backend.translate_batch(units, "ja", "en", &BatchOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capability);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withAdultOverrideOnSupportingBackend_shouldTranslate() {
    let units = common::numbered_units(2);
    let backend = MockBackend::identity().with_adult_content(true);
    let options = BatchOptions { content_class: Some(ContentClass::Adult), ..BatchOptions::default() };

    let result = assert_ok!(backend.translate_batch(units, "ja", "en", &options).await);
    assert_eq!(result.stats.success_count, 2);
    assert!(backend.requests().iter().all(|r| r.content_class == Some(ContentClass::Adult)));
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withUnsupportedLanguage_shouldFailAsLanguageError() {
    let backend = MockBackend::identity().with_languages(LanguageSupport::Only(vec!["ja".into(), "en".into()]));

    let err = backend
        .translate_batch(common::numbered_units(2), "ja", "fr", &BatchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Language);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withEmptyInput_shouldFailValidation() {
    let backend = MockBackend::identity();
    let err = backend.translate_batch(Vec::new(), "ja", "en", &BatchOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withDuplicateSourcesInSequentialChunks_shouldReuseCachedTranslation() {
    let units: Vec<TranslationUnit> = (1..=3)
        .map(|i| TranslationUnit::new(i.to_string(), "name", "同じ", "data/Actors.json"))
        .collect();
    let backend = MockBackend::identity();
    let options = BatchOptions { batch_size: Some(1), ..BatchOptions::default() };

    let result = assert_ok!(backend.translate_batch(units, "ja", "en", &options).await);
    assert_eq!(result.stats.success_count, 3);
    // Chunks of one run sequentially, so later chunks hit the cache
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_translateBatch_withCachedDuplicates_shouldCountOnlySpentTokens() {
    let units: Vec<TranslationUnit> = (1..=3)
        .map(|i| TranslationUnit::new(i.to_string(), "name", "abcdefgh", "data/Actors.json"))
        .collect();
    let backend = MockBackend::identity().with_cost_per_token(0.5);
    let options = BatchOptions { batch_size: Some(1), ..BatchOptions::default() };

    let result = assert_ok!(backend.translate_batch(units, "ja", "en", &options).await);
    assert_eq!(result.stats.success_count, 3);
    assert_eq!(backend.request_count(), 1);
    // One remote call of 4 tokens; the two cache hits cost nothing
    assert_eq!(result.stats.total_tokens, 4);
    assert_eq!(result.stats.total_cost, 2.0);
}
