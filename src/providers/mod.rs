/*!
 * Provider implementations for different translation services.
 *
 * Each module holds a thin HTTP client implementing [`Provider`] and a
 * translation backend built on top of it:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration, also used for LM Studio
 * - Anthropic: Anthropic API integration
 * - Mock: scripted backend for tests and dry runs
 *
 * Clients never retry; retries, caching and rate limiting belong to the
 * resilience layer wrapped around every backend.
 */

use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM provider clients
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Map a transport failure to a provider error
pub(crate) fn send_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(format!("Failed to connect to {}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("Failed to send request to {}: {}", provider, error))
    }
}

/// Map an unsuccessful HTTP status and body to a provider error
pub(crate) fn status_error(provider: &str, status: StatusCode, body: String) -> ProviderError {
    let message = format!("{} API error ({}): {}", provider, status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}

/// Human-readable language name for prompts, falling back to the code
pub(crate) fn display_language(code: &str) -> String {
    crate::language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
}

/// Read an error body, never failing
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string())
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use mock::{MockBackend, MockBehavior};
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
