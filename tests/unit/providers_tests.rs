/*!
 * Tests for backend construction, metadata and request payloads
 */

use rpgmtl::app_config::{BackendConfig, BackendKind, BackendSettings, CacheConfig};
use rpgmtl::errors::ErrorKind;
use rpgmtl::providers::ollama::GenerationRequest;
use rpgmtl::providers::openai::OpenAIRequest;
use rpgmtl::providers::{AnthropicBackend, OllamaBackend, OpenAiBackend};
use rpgmtl::resource::ContentClass;
use rpgmtl::translation::{PromptTemplate, TranslationBackend};

fn config(kind: BackendKind) -> BackendConfig {
    BackendConfig::new(kind, BackendSettings::default().with_api_key("sk-test"))
}

#[test]
fn test_ollama_backend_withDefaults_shouldBeFreeAndAcceptAdult() {
    let backend = OllamaBackend::new(&BackendConfig::default(), &CacheConfig::default()).unwrap();
    let metadata = backend.metadata();

    assert_eq!(metadata.name, "Ollama");
    assert!(metadata.check_content_class(ContentClass::Adult).is_ok());
    assert_eq!(backend.estimate_cost("長いテキスト").cost, 0.0);
    assert!(backend.resilience().limiter.is_none());
    assert!(backend.validate_config().is_ok());
}

#[test]
fn test_openai_backend_withAdultClass_shouldRejectAsCapability() {
    let backend = OpenAiBackend::new(&config(BackendKind::OpenAI), &CacheConfig::default()).unwrap();

    let err = backend.metadata().check_content_class(ContentClass::Adult).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capability);
    assert!(err.to_string().contains("adult"));
    assert!(backend.resilience().limiter.is_some());
}

#[test]
fn test_anthropic_backend_withOpenAiConfig_shouldFailAsConfig() {
    let err = AnthropicBackend::new(&config(BackendKind::OpenAI), &CacheConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_backends_withBatchSizeSetting_shouldDeclareItAsMaxBatch() {
    let mut settings = BackendSettings::default().with_api_key("sk-test");
    settings.batch_size = Some(7);
    let backend =
        AnthropicBackend::new(&BackendConfig::new(BackendKind::Anthropic, settings), &CacheConfig::default()).unwrap();
    assert_eq!(backend.metadata().max_batch_size, 7);

    let default_batch = OpenAiBackend::new(&config(BackendKind::OpenAI), &CacheConfig::default()).unwrap();
    assert_eq!(default_batch.metadata().max_batch_size, 20);
}

#[test]
fn test_estimate_cost_shouldCountFourCharsPerTokenRoundedUp() {
    let backend = AnthropicBackend::new(&config(BackendKind::Anthropic), &CacheConfig::default()).unwrap();
    let estimate = backend.estimate_cost("abcdefghi");
    assert_eq!(estimate.tokens, 3);
    assert!((estimate.cost - 3.0 * 0.000_003).abs() < 1e-12);
}

#[test]
fn test_prompt_render_withAndWithoutContext_shouldSubstituteEverything() {
    let template = PromptTemplate::for_class(ContentClass::Name);

    let with_context = template.render("Japanese", "English", Some("Character name"));
    assert!(with_context.contains("from Japanese to English"));
    assert!(with_context.contains("Context: Character name"));
    assert!(!with_context.contains('{'));

    let without_context = template.render("Japanese", "English", None);
    assert!(!without_context.contains("Context:"));
    assert!(!without_context.contains('{'));
}

#[test]
fn test_ollama_generation_request_shouldSerializeOptionsOnlyWhenSet() {
    let bare = serde_json::to_value(GenerationRequest::new("llama3", "こんにちは")).unwrap();
    assert!(bare.get("options").is_none());

    let full = serde_json::to_value(
        GenerationRequest::new("llama3", "こんにちは").system("sys").temperature(0.3).max_tokens(64).no_stream(),
    )
    .unwrap();
    assert_eq!(full["options"]["num_predict"], 64);
    assert_eq!(full["stream"], false);
    assert_eq!(full["system"], "sys");
}

#[test]
fn test_openai_request_shouldKeepMessageOrder() {
    let request = OpenAIRequest::new("gpt-4o-mini").add_message("system", "rules").add_message("user", "text");
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][1]["content"], "text");
    assert!(json.get("max_tokens").is_none());
}
