use async_trait::async_trait;
use log::{debug, error};
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

/// OpenAI-compatible chat completions client
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication, may be empty for local servers
    api_key: String,
    /// API endpoint URL including the version segment
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Default, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        }
    }

    /// Complete a chat request
    pub async fn chat(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(status_error("OpenAI", status, error_text));
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI response: {}", e)))
    }

    /// List the models served at the endpoint
    pub async fn models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.endpoint);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| send_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            return Err(status_error("OpenAI", status, error_text));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse model list: {}", e)))?;
        Ok(body["data"]
            .as_array()
            .map(|models| models.iter().filter_map(|m| m["id"].as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.chat(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let models = self.models().await?;
        debug!("Endpoint {} serves {} model(s)", self.endpoint, models.len());
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default()
    }
}

/// Translation backend for the OpenAI API and OpenAI-compatible local servers
#[derive(Debug)]
pub struct OpenAiBackend {
    client: OpenAI,
    config: BackendConfig,
    metadata: BackendMetadata,
    resilience: Resilience,
}

impl OpenAiBackend {
    /// Build a backend from an `openai` or `lmstudio` configuration
    pub fn new(config: &BackendConfig, cache: &CacheConfig) -> Result<Self, TranslationError> {
        let kind = config.kind();
        if !matches!(kind, BackendKind::OpenAI | BackendKind::LMStudio) {
            return Err(TranslationError::Config(format!(
                "{} configuration cannot build an OpenAI-compatible backend",
                kind.display_name()
            )));
        }

        let resilience = Resilience::from_config(config, cache)?;
        let profile = ProviderProfile::for_backend(kind);
        let local = kind.is_local();
        let metadata = BackendMetadata {
            name: kind.display_name().to_string(),
            version: "1.0".to_string(),
            cost_per_token: if local { 0.0 } else { 0.000_002 },
            max_batch_size: config.batch_size(),
            max_concurrent_requests: profile.max_concurrent_requests,
            quality_score: if local { 0.7 } else { 0.9 },
            supported_content_classes: if local {
                ContentClass::ALL.to_vec()
            } else {
                ContentClass::ALL.into_iter().filter(|c| !c.requires_adult_support()).collect()
            },
            supported_languages: LanguageSupport::Any,
            supports_adult_content: local,
        };

        Ok(Self {
            client: OpenAI::new(config.api_key(), config.base_url(), config.timeout()),
            config: config.clone(),
            metadata,
            resilience,
        })
    }

    /// Check that the endpoint is reachable and the credentials are accepted
    pub async fn test_connection(&self) -> Result<(), TranslationError> {
        Ok(self.client.test_connection().await?)
    }
}

#[async_trait]
impl TranslationBackend for OpenAiBackend {
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

        let chat = OpenAIRequest::new(self.config.model())
            .add_message("system", system)
            .add_message("user", request.text.clone())
            .temperature(self.config.temperature())
            .max_tokens(self.config.max_tokens());

        let started = Instant::now();
        let response = self.client.complete(chat).await?;

        let mut translated = TranslationResponse::new(OpenAI::extract_text(&response));
        if let Some(usage) = &response.usage {
            translated = translated.with_token_usage(TokenUsage::new(usage.prompt_tokens, usage.completion_tokens));
        }
        translated.meta.processing_time = started.elapsed();
        Ok(translated)
    }
}
