use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

use crate::errors::TranslationError;
use crate::language_utils;
use crate::resource::ContentClass;
use crate::translation::concurrency::ProviderProfile;

/// Application configuration module
/// This module handles the configuration surface consumed by the backends,
/// the registry and the orchestrator. Every field has a default, so a partial
/// file never fails to load; missing values fall back per backend type.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Backend to translate with
    #[serde(default)]
    pub backend: BackendConfig,

    /// Run-level batching
    #[serde(default)]
    pub run: RunConfig,

    /// Response cache settings shared by all backends
    #[serde(default)]
    pub cache: CacheConfig,

    /// Backend instance lifetime
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // @backend: Ollama
    #[default]
    Ollama,
    // @backend: OpenAI
    OpenAI,
    // @backend: Anthropic
    Anthropic,
    // @backend: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [Self::Ollama, Self::OpenAI, Self::Anthropic, Self::LMStudio];

    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    /// Whether the backend talks to a server on the local machine
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Ollama | Self::LMStudio)
    }

    /// Whether the backend can serve the given model id.
    ///
    /// Local servers run whatever model is loaded; hosted APIs only serve
    /// their own model families.
    pub fn supports_model(&self, model: &str) -> bool {
        let model = model.trim();
        if model.is_empty() {
            return false;
        }
        match self {
            Self::Ollama | Self::LMStudio => true,
            Self::OpenAI => ["gpt-", "o1", "o3", "o4", "chatgpt-"].iter().any(|p| model.starts_with(p)),
            Self::Anthropic => model.starts_with("claude-"),
        }
    }

    /// Backend-specific explanation for an unsupported model
    pub fn unsupported_model_message(&self, model: &str) -> String {
        match self {
            Self::OpenAI => format!("Model '{}' is not an OpenAI chat model (expected gpt-*, o1*, o3*, o4* or chatgpt-*)", model),
            Self::Anthropic => format!("Model '{}' is not an Anthropic model (expected claude-*)", model),
            Self::Ollama | Self::LMStudio => format!("{} requires a non-empty model name", self.display_name()),
        }
    }

    pub fn default_model(&self) -> String {
        match self {
            Self::Ollama => default_ollama_model(),
            Self::OpenAI => default_openai_model(),
            Self::Anthropic => default_anthropic_model(),
            Self::LMStudio => default_lmstudio_model(),
        }
    }

    pub fn default_endpoint(&self) -> String {
        match self {
            Self::Ollama => default_ollama_endpoint(),
            Self::OpenAI => default_openai_endpoint(),
            Self::Anthropic => default_anthropic_endpoint(),
            Self::LMStudio => default_lmstudio_endpoint(),
        }
    }

    pub fn default_rate_limit(&self) -> Option<u32> {
        ProviderProfile::for_backend(*self).target_rpm
    }

    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Ollama | Self::LMStudio => Duration::from_secs(120),
            Self::OpenAI => Duration::from_secs(30),
            Self::Anthropic => Duration::from_secs(60),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(TranslationError::Validation(format!("Invalid backend type: {}", s))),
        }
    }
}

/// Settings shared by every backend type; all optional
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BackendSettings {
    // @field: Model name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    // @field: API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    // @field: Service URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    // @field: Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    // @field: Max tokens to generate per request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    // @field: Default content class for requests without one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_class: Option<ContentClass>,

    // @field: Units per backend chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    // @field: Retries after the first attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,

    // @field: Base backoff in milliseconds, doubled on each retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_backoff_ms: Option<u64>,

    // @field: Request timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    // @field: Rate limit (requests per minute), 0 disables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
}

impl BackendSettings {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Backend configuration, one case per backend type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Ollama(BackendSettings),
    OpenAI(BackendSettings),
    Anthropic(BackendSettings),
    LMStudio(BackendSettings),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Ollama(BackendSettings::default())
    }
}

impl BackendConfig {
    /// Build the config case for `kind`
    pub fn new(kind: BackendKind, settings: BackendSettings) -> Self {
        match kind {
            BackendKind::Ollama => Self::Ollama(settings),
            BackendKind::OpenAI => Self::OpenAI(settings),
            BackendKind::Anthropic => Self::Anthropic(settings),
            BackendKind::LMStudio => Self::LMStudio(settings),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Ollama(_) => BackendKind::Ollama,
            Self::OpenAI(_) => BackendKind::OpenAI,
            Self::Anthropic(_) => BackendKind::Anthropic,
            Self::LMStudio(_) => BackendKind::LMStudio,
        }
    }

    pub fn settings(&self) -> &BackendSettings {
        match self {
            Self::Ollama(s) | Self::OpenAI(s) | Self::Anthropic(s) | Self::LMStudio(s) => s,
        }
    }

    pub fn settings_mut(&mut self) -> &mut BackendSettings {
        match self {
            Self::Ollama(s) | Self::OpenAI(s) | Self::Anthropic(s) | Self::LMStudio(s) => s,
        }
    }

    /// Get the model, falling back to the backend default
    pub fn model(&self) -> String {
        match self.settings().model.as_deref() {
            Some(model) if !model.trim().is_empty() => model.to_string(),
            _ => self.kind().default_model(),
        }
    }

    /// Get the API key; empty when none is configured
    pub fn api_key(&self) -> String {
        self.settings().api_key.clone().unwrap_or_default()
    }

    /// Get the endpoint, falling back to the backend default
    pub fn base_url(&self) -> String {
        match self.settings().base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => self.kind().default_endpoint(),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.settings().temperature.unwrap_or_else(default_temperature)
    }

    pub fn max_tokens(&self) -> u32 {
        self.settings().max_tokens.unwrap_or_else(|| max_tokens_for_model(&self.model()))
    }

    pub fn content_class(&self) -> ContentClass {
        self.settings().content_class.unwrap_or_default()
    }

    pub fn batch_size(&self) -> usize {
        self.settings()
            .batch_size
            .filter(|size| *size > 0)
            .unwrap_or_else(|| ProviderProfile::for_backend(self.kind()).recommended_batch_size)
    }

    pub fn retry_count(&self) -> u32 {
        self.settings().retry_count.unwrap_or_else(default_retry_count)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.settings().retry_backoff_ms.filter(|ms| *ms > 0).unwrap_or_else(default_retry_backoff_ms))
    }

    pub fn timeout(&self) -> Duration {
        self.settings()
            .timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.kind().default_timeout())
    }

    /// Requests per minute; `None` disables client-side rate limiting
    pub fn rate_limit(&self) -> Option<u32> {
        match self.settings().rate_limit {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => self.kind().default_rate_limit(),
        }
    }

    /// Short stable digest of the API key, empty when there is no key
    pub fn credential_fingerprint(&self) -> String {
        let api_key = self.api_key();
        if api_key.is_empty() {
            return String::new();
        }
        let digest = Sha256::digest(api_key.as_bytes());
        digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
    }

    /// Check the settings that do not need a network round trip
    pub fn validate(&self) -> Result<(), TranslationError> {
        let kind = self.kind();
        let model = self.model();
        if !kind.supports_model(&model) {
            return Err(TranslationError::Validation(kind.unsupported_model_message(&model)));
        }

        if !kind.is_local() && self.api_key().trim().is_empty() {
            return Err(TranslationError::Config(format!("API key is required for {} backend", kind.display_name())));
        }

        let base_url = self.base_url();
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| TranslationError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TranslationError::Config(format!("Unsupported URL scheme in '{}'", base_url)));
        }

        let temperature = self.temperature();
        if !(0.0..=2.0).contains(&temperature) {
            return Err(TranslationError::Config(format!("Temperature {} is outside 0.0..=2.0", temperature)));
        }

        Ok(())
    }
}

/// Run-level batching settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunConfig {
    /// Units per administrative batch
    #[serde(default = "default_run_batch_size")]
    pub batch_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { batch_size: default_run_batch_size() }
    }
}

/// Response cache settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached responses per backend
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Seconds a cached response stays valid
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Backend registry settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Seconds an unused backend instance is kept
    #[serde(default = "default_registry_ttl_secs")]
    pub ttl_secs: u64,
}

impl RegistryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { ttl_secs: default_registry_ttl_secs() }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Get the maximum number of tokens for a given model
pub fn max_tokens_for_model(model: &str) -> u32 {
    match model {
        "gpt-4" | "gpt-4-0613" => 8192,
        "gpt-4-32k" | "gpt-4-32k-0613" => 32768,
        "gpt-3.5-turbo-16k" | "gpt-3.5-turbo-16k-0613" => 16384,
        m if m.starts_with("gpt-4o") || m.starts_with("gpt-4-turbo") => 4096,
        m if m.starts_with("gpt-3.5-turbo") => 4096,
        m if m.starts_with("claude-") => 4096,
        _ => 2048,
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_run_batch_size() -> usize {
    50
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_registry_ttl_secs() -> u64 {
    1800
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_lmstudio_endpoint() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_lmstudio_model() -> String {
    "local-model".to_string()
}

impl Config {
    /// Load a configuration file, falling back to defaults for absent fields
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), TranslationError> {
        language_utils::get_language_name(&self.source_language)?;
        language_utils::get_language_name(&self.target_language)?;

        self.backend.validate()?;

        if self.run.batch_size == 0 {
            return Err(TranslationError::Config("Run batch_size must be greater than zero".to_string()));
        }
        if self.cache.capacity == 0 || self.cache.ttl_secs == 0 {
            return Err(TranslationError::Config("Cache capacity and ttl_secs must be greater than zero".to_string()));
        }
        if self.registry.ttl_secs == 0 {
            return Err(TranslationError::Config("Registry ttl_secs must be greater than zero".to_string()));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            backend: BackendConfig::default(),
            run: RunConfig::default(),
            cache: CacheConfig::default(),
            registry: RegistryConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
