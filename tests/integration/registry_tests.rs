/*!
 * Integration tests for the backend registry
 */

use rpgmtl::app_config::{BackendConfig, BackendKind, BackendSettings, CacheConfig};
use rpgmtl::errors::{ErrorKind, TranslationError};
use rpgmtl::providers::MockBackend;
use rpgmtl::registry::{BackendRegistry, RegistryKey, constructor};
use rpgmtl::translation::{TranslationBackend, TranslationRequest};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_test::assert_ok;

fn mock_registry(builds: Arc<AtomicUsize>) -> BackendRegistry {
    let mut registry = BackendRegistry::new(Duration::from_secs(30));
    registry.register(
        BackendKind::Ollama,
        constructor(move |config: &BackendConfig| -> Result<MockBackend, TranslationError> {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(MockBackend::prefixed("EN:").with_config(config.clone()))
        }),
    );
    registry
}

fn ollama(model: &str) -> BackendConfig {
    BackendConfig::new(BackendKind::Ollama, BackendSettings::default().with_model(model))
}

#[tokio::test(start_paused = true)]
async fn test_createOrGet_withMockConstructor_shouldBuildOncePerKey() {
    let builds = Arc::new(AtomicUsize::new(0));
    let registry = mock_registry(builds.clone());

    let backend = assert_ok!(registry.create_or_get(&ollama("llama3")));
    let response = assert_ok!(backend.translate(&TranslationRequest::new("剣", "ja", "en")).await);
    assert_eq!(response.translated_text, "EN:剣");

    assert_ok!(registry.create_or_get(&ollama("llama3")));
    assert_ok!(registry.create_or_get(&ollama("qwen2.5")));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert!(registry.contains(&RegistryKey::for_config(&ollama("qwen2.5"))));
}

#[tokio::test(start_paused = true)]
async fn test_createOrGet_afterTtl_shouldRebuildInstance() {
    let builds = Arc::new(AtomicUsize::new(0));
    let registry = mock_registry(builds.clone());

    let first = assert_ok!(registry.create_or_get(&ollama("llama3")));
    tokio::time::advance(Duration::from_secs(30)).await;
    let second = assert_ok!(registry.create_or_get(&ollama("llama3")));

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert_eq!(registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_createOrGet_withoutConstructor_shouldFailAsConfig() {
    let registry = mock_registry(Arc::new(AtomicUsize::new(0)));
    let config = BackendConfig::new(BackendKind::Anthropic, BackendSettings::default().with_api_key("sk"));

    let err = registry.create_or_get(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_removeAndClear_shouldDropCachedInstances() {
    let registry = BackendRegistry::with_default_backends(CacheConfig::default(), Duration::from_secs(60));
    let config = BackendConfig::new(BackendKind::OpenAI, BackendSettings::default().with_api_key("sk-1"));
    let key = RegistryKey::for_config(&config);

    let backend = assert_ok!(registry.create_or_get(&config));
    assert_eq!(backend.metadata().name, "OpenAI");
    assert!(registry.remove(&key));
    assert!(!registry.remove(&key));

    assert_ok!(registry.create_or_get(&config));
    assert_ok!(registry.create_or_get(&BackendConfig::default()));
    assert_eq!(registry.len(), 2);
    registry.clear();
    assert!(registry.is_empty());
}
