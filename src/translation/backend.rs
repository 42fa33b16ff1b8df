/*!
 * Backend capability interface.
 *
 * A backend binds one remote inference service and model. Concrete backends
 * implement only [`TranslationBackend::perform_translation`] plus their static
 * metadata; caching, rate limiting, retries and batching are composed around
 * that call by the free functions in [`crate::translation::core`] and
 * [`crate::translation::batch`].
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::app_config::BackendConfig;
use crate::errors::{ErrorKind, TranslationError};
use crate::language_utils;
use crate::resource::{ContentClass, TranslationUnit, UnitKey};
use crate::translation::cache::CacheItem;
use crate::translation::batch::translate_batch;
use crate::translation::core::{estimate_cost, translate, Resilience};
use crate::translation::prompts::PromptTemplate;

/// Language pairs a backend accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSupport {
    /// Any valid ISO 639 code
    Any,
    /// Only the listed codes, compared after normalization
    Only(Vec<String>),
}

impl LanguageSupport {
    /// Whether `code` is accepted; `code` must already be a valid ISO code
    pub fn supports(&self, code: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(codes) => codes.iter().any(|c| language_utils::language_codes_match(c, code)),
        }
    }
}

/// Static per-backend facts
#[derive(Debug, Clone, PartialEq)]
pub struct BackendMetadata {
    pub name: String,
    pub version: String,
    /// Price of one token in USD
    pub cost_per_token: f64,
    /// Largest chunk the backend translates at once
    pub max_batch_size: usize,
    /// Requests in flight within one chunk
    pub max_concurrent_requests: usize,
    /// Relative quality in `0.0..=1.0`
    pub quality_score: f32,
    pub supported_content_classes: Vec<ContentClass>,
    pub supported_languages: LanguageSupport,
    pub supports_adult_content: bool,
}

impl BackendMetadata {
    /// Reject a content class the backend does not declare
    pub fn check_content_class(&self, content_class: ContentClass) -> Result<(), TranslationError> {
        if content_class.requires_adult_support() && !self.supports_adult_content {
            return Err(TranslationError::Capability {
                backend: self.name.clone(),
                capability: "adult content".to_string(),
            });
        }
        if !self.supported_content_classes.contains(&content_class) {
            return Err(TranslationError::Capability {
                backend: self.name.clone(),
                capability: format!("content class '{}'", content_class),
            });
        }
        Ok(())
    }

    /// Reject invalid codes and language pairs outside the declared support
    pub fn check_languages(&self, source_language: &str, target_language: &str) -> Result<(), TranslationError> {
        for code in [source_language, target_language] {
            language_utils::validate_language_code(code)?;
            if !self.supported_languages.supports(code) {
                return Err(TranslationError::Language(format!(
                    "{} does not support language '{}'",
                    self.name, code
                )));
            }
        }
        Ok(())
    }
}

/// A single translation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_class: Option<ContentClass>,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            context: None,
            content_class: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_content_class(mut self, content_class: ContentClass) -> Self {
        self.content_class = Some(content_class);
        self
    }

    /// Build the request for one unit
    pub fn for_unit(unit: &TranslationUnit, source_language: &str, target_language: &str) -> Self {
        Self::new(unit.source.clone(), source_language, target_language)
            .with_context(unit.context.clone())
            .with_content_class(unit.content_class)
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self { prompt, completion, total: prompt + completion }
    }
}

/// Per-call bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub processing_time: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,
}

/// Result of a single translation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default)]
    pub meta: ResponseMeta,
}

impl TranslationResponse {
    pub fn new(translated_text: impl Into<String>) -> Self {
        Self {
            translated_text: translated_text.into(),
            confidence: None,
            token_usage: None,
            cost: None,
            meta: ResponseMeta::default(),
        }
    }

    pub fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }
}

impl CacheItem for TranslationResponse {
    fn is_empty_item(&self) -> bool {
        self.translated_text.is_empty()
    }
}

/// Token and cost estimate for a text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub tokens: u64,
    pub cost: f64,
}

/// Options for [`TranslationBackend::translate_batch`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOptions {
    /// Requested chunk size, capped by the backend's `max_batch_size`
    pub batch_size: Option<usize>,
    /// Content class applied to every unit, overriding the unit's own
    pub content_class: Option<ContentClass>,
    /// Cap on requests in flight, defaults to the backend's declared width
    pub max_concurrency: Option<usize>,
}

/// Aggregated statistics of a batch or run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub total_tokens: u64,
    pub total_cost: f64,
    pub success_count: usize,
    pub failed_count: usize,
    pub total_processing_time: Duration,
}

impl BatchStats {
    /// Fold another set of statistics into this one
    pub fn absorb(&mut self, other: &BatchStats) {
        self.total_tokens += other.total_tokens;
        self.total_cost += other.total_cost;
        self.success_count += other.success_count;
        self.failed_count += other.failed_count;
        self.total_processing_time += other.total_processing_time;
    }
}

/// A unit that could not be translated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchError {
    pub unit: UnitKey,
    /// Source text of the failed unit
    pub text: String,
    pub message: String,
    pub kind: ErrorKind,
    pub retry_count: u32,
}

/// Units in input order plus statistics and per-unit failures
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub units: Vec<TranslationUnit>,
    pub stats: BatchStats,
    pub errors: Vec<BatchError>,
}

/// Capability interface every translation backend implements
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Static facts about the backend
    fn metadata(&self) -> &BackendMetadata;

    /// Configuration the backend was built from
    fn config(&self) -> &BackendConfig;

    /// Cache, rate limiter and retry policy wrapped around every call
    fn resilience(&self) -> &Resilience;

    /// Perform one remote translation without any resilience wrapping
    async fn perform_translation(&self, request: &TranslationRequest) -> Result<TranslationResponse, TranslationError>;

    /// Check the configuration without a network round trip
    fn validate_config(&self) -> Result<(), TranslationError> {
        self.config().validate()
    }

    /// Estimate token count and cost of translating `text`
    fn estimate_cost(&self, text: &str) -> CostEstimate {
        estimate_cost(self.metadata(), text)
    }

    /// System prompt used for a content class
    fn prompt(&self, content_class: ContentClass) -> PromptTemplate {
        PromptTemplate::for_class(content_class)
    }

    /// Translate one text through cache, rate limiter and retries
    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse, TranslationError> {
        translate(self, request).await
    }

    /// Translate units in capped chunks, collecting per-unit failures
    async fn translate_batch(
        &self,
        units: Vec<TranslationUnit>,
        source_language: &str,
        target_language: &str,
        options: &BatchOptions,
    ) -> Result<BatchResult, TranslationError> {
        translate_batch(self, units, source_language, target_language, options).await
    }
}
