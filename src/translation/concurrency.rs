/*!
 * Backend-specific concurrency tuning.
 *
 * Defaults derived from backend characteristics such as rate limits and
 * whether the server runs locally.
 */

use crate::app_config::BackendKind;

/// Backend concurrency profile with tuned defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Maximum requests in flight within one chunk
    pub max_concurrent_requests: usize,
    /// Target requests per minute (for rate limiting)
    pub target_rpm: Option<u32>,
    /// Recommended units per chunk
    pub recommended_batch_size: usize,
}

impl ProviderProfile {
    /// Get the profile for a given backend
    pub fn for_backend(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Ollama => Self {
                // Local server, limited by the GPU rather than a quota
                max_concurrent_requests: 8,
                target_rpm: None,
                recommended_batch_size: 10,
            },
            BackendKind::OpenAI => Self {
                max_concurrent_requests: 10,
                target_rpm: Some(60),
                recommended_batch_size: 20,
            },
            BackendKind::Anthropic => Self {
                max_concurrent_requests: 5,
                target_rpm: Some(45),
                recommended_batch_size: 20,
            },
            BackendKind::LMStudio => Self {
                max_concurrent_requests: 6,
                target_rpm: None,
                recommended_batch_size: 8,
            },
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override.filter(|n| *n > 0).unwrap_or(self.max_concurrent_requests)
    }
}
