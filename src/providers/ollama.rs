use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::app_config::{BackendConfig, CacheConfig};
use crate::errors::{ProviderError, TranslationError};
use crate::providers::{display_language, error_body, send_error, status_error, Provider};
use crate::resource::ContentClass;
use crate::translation::backend::{
    BackendMetadata, LanguageSupport, TokenUsage, TranslationBackend, TranslationRequest, TranslationResponse,
};
use crate::translation::concurrency::ProviderProfile;
use crate::translation::core::Resilience;

/// Ollama client for interacting with Ollama API
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    /// Total duration of the request in nanoseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: None,
            keep_alive: None,
        }
    }

    /// Set the system message
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(max_tokens);
        self
    }

    /// Set how long to keep the model loaded
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }

    /// Disable streaming
    pub fn no_stream(mut self) -> Self {
        self.stream = Some(false);
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a complete URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                // Ollama speaks HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(status_error("Ollama", status, error_text));
        }

        response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama response: {}", e)))
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| send_error("Ollama", e))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.generate(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.response.trim().to_string()
    }
}

/// Translation backend running on a local Ollama server
#[derive(Debug)]
pub struct OllamaBackend {
    client: Ollama,
    config: BackendConfig,
    metadata: BackendMetadata,
    resilience: Resilience,
}

impl OllamaBackend {
    /// Build a backend from its configuration
    pub fn new(config: &BackendConfig, cache: &CacheConfig) -> Result<Self, TranslationError> {
        let resilience = Resilience::from_config(config, cache)?;
        let profile = ProviderProfile::for_backend(config.kind());
        let metadata = BackendMetadata {
            name: "Ollama".to_string(),
            version: "1.0".to_string(),
            cost_per_token: 0.0,
            max_batch_size: config.batch_size(),
            max_concurrent_requests: profile.max_concurrent_requests,
            quality_score: 0.7,
            supported_content_classes: ContentClass::ALL.to_vec(),
            supported_languages: LanguageSupport::Any,
            supports_adult_content: true,
        };

        Ok(Self {
            client: Ollama::new(config.base_url(), config.timeout()),
            config: config.clone(),
            metadata,
            resilience,
        })
    }

    /// Check that the server is reachable
    pub async fn test_connection(&self) -> Result<(), TranslationError> {
        Ok(self.client.test_connection().await?)
    }
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
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

        let generation = GenerationRequest::new(self.config.model(), request.text.clone())
            .system(system)
            .temperature(self.config.temperature())
            .max_tokens(self.config.max_tokens())
            .no_stream();

        let started = Instant::now();
        let response = self.client.complete(generation).await?;
        let usage = TokenUsage::new(response.prompt_eval_count.unwrap_or(0), response.eval_count.unwrap_or(0));

        let mut translated = TranslationResponse::new(Ollama::extract_text(&response)).with_token_usage(usage);
        translated.meta.processing_time = started.elapsed();
        Ok(translated)
    }
}
