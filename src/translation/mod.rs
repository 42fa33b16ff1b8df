/*!
 * Translation pipeline.
 *
 * - `backend`: capability interface and request/response types
 * - `core`: cache, rate limit and retry composition for single texts
 * - `batch`: chunked concurrent translation of unit lists
 * - `orchestrator`: cancellable runs over administrative batches
 * - `cache`, `rate_limiter`, `retry`: resilience utilities
 * - `concurrency`: per-backend tuning defaults
 * - `prompts`: system prompts per content class
 */

// Re-export main types for easier usage
pub use self::backend::{
    BackendMetadata, BatchError, BatchOptions, BatchResult, BatchStats, CostEstimate, LanguageSupport,
    ResponseMeta, TokenUsage, TranslationBackend, TranslationRequest, TranslationResponse,
};
pub use self::cache::{CacheKey, TtlCache};
pub use self::core::{Resilience, TranslationCache};
pub use self::orchestrator::{BatchOrchestrator, CancellationFlag, OrchestratorConfig, RunProgress, RunReport};
pub use self::prompts::PromptTemplate;
pub use self::rate_limiter::RateLimiter;
pub use self::retry::{Attempted, LogRetryObserver, NoopRetryObserver, RetryObserver, RetryPolicy};

// Submodules
pub mod backend;
pub mod batch;
pub mod cache;
pub mod concurrency;
pub mod core;
pub mod orchestrator;
pub mod prompts;
pub mod rate_limiter;
pub mod retry;
