use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::app_config::{BackendConfig, BackendKind, CacheConfig};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::{display_language, error_body, send_error, status_error, Provider};
use crate::resource::ContentClass;
use crate::translation::backend::{
    BackendMetadata, LanguageSupport, TokenUsage, TranslationBackend, TranslationRequest, TranslationResponse,
};
use crate::translation::concurrency::ProviderProfile;
use crate::translation::core::Resilience;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic client for interacting with Anthropic API
#[derive(Debug, Clone)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Model used for connection tests
    model: String,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct AnthropicUsage {
    /// Number of input tokens
    pub input_tokens: u64,
    /// Number of output tokens
    pub output_tokens: u64,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    pub content: Vec<AnthropicContent>,
    /// Token usage information
    pub usage: AnthropicUsage,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The text content, absent for non-text blocks
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    /// Create a new Anthropic request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            temperature: None,
            max_tokens,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(AnthropicMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Complete a messages request
    pub async fn messages(&self, request: AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        let api_url = format!("{}/v1/messages", self.endpoint);

        let response = self
            .client
            .post(&api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Anthropic", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(status_error("Anthropic", status, error_text));
        }

        response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Anthropic API response: {}", e)))
    }
}

#[async_trait]
impl Provider for Anthropic {
    type Request = AnthropicRequest;
    type Response = AnthropicResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.messages(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = AnthropicRequest::new(self.model.clone(), 10).add_message("user", "Hello");
        self.messages(request).await?;
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<String>()
            .trim()
            .to_string()
    }
}

/// Translation backend for the Anthropic messages API
#[derive(Debug)]
pub struct AnthropicBackend {
    client: Anthropic,
    config: BackendConfig,
    metadata: BackendMetadata,
    resilience: Resilience,
}

impl AnthropicBackend {
    /// Build a backend from its configuration
    pub fn new(config: &BackendConfig, cache: &CacheConfig) -> Result<Self, TranslationError> {
        if config.kind() != BackendKind::Anthropic {
            return Err(TranslationError::Config(format!(
                "{} configuration cannot build an Anthropic backend",
                config.kind().display_name()
            )));
        }

        let resilience = Resilience::from_config(config, cache)?;
        let profile = ProviderProfile::for_backend(BackendKind::Anthropic);
        let metadata = BackendMetadata {
            name: "Anthropic".to_string(),
            version: ANTHROPIC_VERSION.to_string(),
            cost_per_token: 0.000_003,
            max_batch_size: config.batch_size(),
            max_concurrent_requests: profile.max_concurrent_requests,
            quality_score: 0.92,
            supported_content_classes: ContentClass::ALL.into_iter().filter(|c| !c.requires_adult_support()).collect(),
            supported_languages: LanguageSupport::Any,
            supports_adult_content: false,
        };

        Ok(Self {
            client: Anthropic::new(config.api_key(), config.base_url(), config.model(), config.timeout()),
            config: config.clone(),
            metadata,
            resilience,
        })
    }

    /// Check that the API accepts the credentials
    pub async fn test_connection(&self) -> Result<(), TranslationError> {
        Ok(self.client.test_connection().await?)
    }
}

#[async_trait]
impl TranslationBackend for AnthropicBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn resilience(&self) -> &Resilience {
        &self.resilience
    }

    async fn perform_translation(&self, request: &TranslationRequest) -> Result<TranslationResponse, TranslationError> {
        let content_class = request.content_class.unwrap_or_else(|| self.config.content_class());
        let system = self.prompt(content_class).render(
            &display_language(&request.source_language),
            &display_language(&request.target_language),
            request.context.as_deref(),
        );

        let message = AnthropicRequest::new(self.config.model(), self.config.max_tokens())
            .system(system)
            .add_message("user", request.text.clone())
            .temperature(self.config.temperature());

        let started = Instant::now();
        let response = self.client.complete(message).await?;
        let usage = TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens);

        let mut translated = TranslationResponse::new(Anthropic::extract_text(&response)).with_token_usage(usage);
        translated.meta.processing_time = started.elapsed();
        Ok(translated)
    }
}
