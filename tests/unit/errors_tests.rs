/*!
 * Tests for error types and conversions
 */

use rpgmtl::errors::{AppError, ErrorKind, ProviderError, TranslationError};

#[test]
fn test_providerError_requestFailed_shouldDisplayCorrectly() {
    let error = ProviderError::RequestFailed("Connection timeout".to_string());
    let display = format!("{}", error);
    assert!(display.contains("API request failed"));
    assert!(display.contains("Connection timeout"));
}

#[test]
fn test_translationError_api_shouldDisplayStatusWhenKnown() {
    let with_status = TranslationError::Api { status: Some(503), message: "overloaded".to_string() };
    assert_eq!(with_status.to_string(), "API error (503): overloaded");

    let without_status = TranslationError::Api { status: None, message: "empty".to_string() };
    assert_eq!(without_status.to_string(), "API error: empty");
}

#[test]
fn test_errorKind_isRetryable_shouldOnlyAllowRemoteKinds() {
    let retryable = [ErrorKind::Api, ErrorKind::Network, ErrorKind::Unknown];
    let terminal = [ErrorKind::Validation, ErrorKind::Capability, ErrorKind::Language, ErrorKind::Config];

    assert!(retryable.iter().all(|k| k.is_retryable()));
    assert!(terminal.iter().all(|k| !k.is_retryable()));
}

#[test]
fn test_classify_withConnectionMessages_shouldBeNetwork() {
    for message in ["connect ECONNREFUSED 127.0.0.1:11434", "operation timed out", "error sending request for url"] {
        assert_eq!(TranslationError::classify(message).kind(), ErrorKind::Network, "{}", message);
    }
}

#[test]
fn test_classify_withAuthOrMissingModel_shouldBeConfig() {
    assert_eq!(TranslationError::classify("401 Unauthorized").kind(), ErrorKind::Config);
    assert_eq!(TranslationError::classify("Invalid API key provided").kind(), ErrorKind::Config);
    assert_eq!(TranslationError::classify("model 'foo' not found").kind(), ErrorKind::Config);
}

#[test]
fn test_classify_withStatusCodes_shouldBeApi() {
    assert_eq!(
        TranslationError::classify("429 Too Many Requests"),
        TranslationError::Api { status: Some(429), message: "429 Too Many Requests".to_string() }
    );
    assert_eq!(
        TranslationError::classify("server said 500"),
        TranslationError::Api { status: Some(500), message: "server said 500".to_string() }
    );
}

#[test]
fn test_classify_withUnrecognizedMessage_shouldBeUnknown() {
    let error = TranslationError::classify("something odd happened");
    assert_eq!(error, TranslationError::Unknown("something odd happened".to_string()));
    assert!(error.is_retryable());
}

#[test]
fn test_from_providerError_shouldMapIntoTaxonomy() {
    let network: TranslationError = ProviderError::ConnectionError("refused".into()).into();
    assert_eq!(network.kind(), ErrorKind::Network);

    let auth: TranslationError = ProviderError::AuthenticationError("bad key".into()).into();
    assert_eq!(auth.kind(), ErrorKind::Config);

    let limited: TranslationError = ProviderError::RateLimitExceeded("slow down".into()).into();
    assert_eq!(limited, TranslationError::Api { status: Some(429), message: "slow down".into() });

    let missing: TranslationError = ProviderError::ApiError { status_code: 404, message: "no model".into() }.into();
    assert_eq!(missing.kind(), ErrorKind::Config);

    let server: TranslationError = ProviderError::ApiError { status_code: 502, message: "gateway".into() }.into();
    assert_eq!(server, TranslationError::Api { status: Some(502), message: "gateway".into() });

    let parse: TranslationError = ProviderError::ParseError("bad json".into()).into();
    assert_eq!(parse.kind(), ErrorKind::Api);
}

#[test]
fn test_appError_from_sources_shouldWrapMessages() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert!(matches!(AppError::from(io), AppError::File(_)));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(AppError::from(json), AppError::Document(_)));

    let translation = AppError::from(TranslationError::Validation("empty".into()));
    assert_eq!(translation.to_string(), "Translation error: Validation error: empty");
}
