/*!
 * Error types for the rpgmtl library.
 *
 * `TranslationError` is the taxonomy every operation reports in. Validation,
 * capability and configuration problems are raised before any remote call;
 * API, network and unknown failures are the only retryable kinds.
 * `ProviderError` is the transport-level error produced by the HTTP clients
 * and is classified into the taxonomy on conversion.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Plain classification of a [`TranslationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Capability,
    Language,
    Config,
    Api,
    Network,
    Unknown,
}

impl ErrorKind {
    /// Whether failures of this kind may be retried
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Api | Self::Network | Self::Unknown)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Capability => "capability",
            Self::Language => "language",
            Self::Config => "config",
            Self::Api => "api",
            Self::Network => "network",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during extraction, translation and merge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Malformed input such as an empty unit list or an unsupported model
    #[error("Validation error: {0}")]
    Validation(String),

    /// The selected backend does not declare the requested capability
    #[error("Capability error: {backend} does not support {capability}")]
    Capability {
        /// Backend name
        backend: String,
        /// The missing capability
        capability: String,
    },

    /// Unsupported or invalid language code
    #[error("Language error: {0}")]
    Language(String),

    /// Missing or invalid credentials or parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote service returned an application-level error
    #[error("API error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Api {
        /// HTTP status if known
        status: Option<u16>,
        /// Error message from the service
        message: String,
    },

    /// A connection could not be established
    #[error("Network error: {0}")]
    Network(String),

    /// Unclassified failure
    #[error("Unknown error: {0}")]
    Unknown(String),
}

static STATUS_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([45]\d{2})\b").expect("status code pattern is valid")
});

static CONNECTION_FAILURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(econnrefused|connection (refused|reset|closed)|failed to connect|error sending request|dns error|timed out|timeout)")
        .expect("connection pattern is valid")
});

static AUTH_FAILURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(unauthori[sz]ed|forbidden|invalid (api )?key|authentication|permission denied)")
        .expect("auth pattern is valid")
});

static NOT_FOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(not found|no such model|does not exist)").expect("not-found pattern is valid")
});

static RATE_LIMITED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(rate limit|too many requests|quota)").expect("rate-limit pattern is valid")
});

impl TranslationError {
    /// Get the taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Capability { .. } => ErrorKind::Capability,
            Self::Language(_) => ErrorKind::Language,
            Self::Config(_) => ErrorKind::Config,
            Self::Api { .. } => ErrorKind::Api,
            Self::Network(_) => ErrorKind::Network,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Whether this error may be retried
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Classify a free-form remote error message.
    ///
    /// Remote services are not under our control, so the message text is
    /// matched against known patterns: connection failures become `Network`,
    /// authentication and not-found failures become `Config`, rate limits and
    /// any other HTTP status become `Api`.
    pub fn classify(message: &str) -> Self {
        let status = STATUS_CODE
            .captures(message)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u16>().ok());

        if CONNECTION_FAILURE.is_match(message) {
            return Self::Network(message.to_string());
        }
        if matches!(status, Some(401) | Some(403)) || AUTH_FAILURE.is_match(message) {
            return Self::Config(format!("authentication failed: {}", message));
        }
        if status == Some(404) || NOT_FOUND.is_match(message) {
            return Self::Config(format!("resource not found: {}", message));
        }
        if status == Some(429) || RATE_LIMITED.is_match(message) {
            return Self::Api { status: Some(429), message: message.to_string() };
        }
        if let Some(status) = status {
            return Self::Api { status: Some(status), message: message.to_string() };
        }

        Self::Unknown(message.to_string())
    }
}

impl From<ProviderError> for TranslationError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::ConnectionError(message) => Self::Network(message),
            ProviderError::AuthenticationError(message) => {
                Self::Config(format!("authentication failed: {}", message))
            }
            ProviderError::RateLimitExceeded(message) => Self::Api { status: Some(429), message },
            ProviderError::ApiError { status_code: 401 | 403, message } => {
                Self::Config(format!("authentication failed: {}", message))
            }
            ProviderError::ApiError { status_code: 404, message } => {
                Self::Config(format!("resource not found: {}", message))
            }
            ProviderError::ApiError { status_code, message } => Self::Api { status: Some(status_code), message },
            ProviderError::ParseError(message) => Self::Api { status: None, message },
            ProviderError::RequestFailed(message) => Self::classify(&message),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Malformed resource document
    #[error("Document error: {0}")]
    Document(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Document(error.to_string())
    }
}
