/*!
 * Backend registry and factory.
 *
 * The registry maps a `(backend type, model, credential fingerprint)` key to a
 * validated backend instance. Instances are built through a per-type
 * constructor table and cached only after construction and validation both
 * succeed. Entries unused for longer than the registry TTL are dropped by
 * [`BackendRegistry::cleanup`] or replaced on the next lookup.
 *
 * The registry is an ordinary value owned by the caller; there is no global
 * instance.
 */

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::app_config::{BackendConfig, BackendKind, CacheConfig};
use crate::errors::TranslationError;
use crate::providers::{AnthropicBackend, OllamaBackend, OpenAiBackend};
use crate::translation::backend::TranslationBackend;

/// Builds a backend instance from its configuration
pub type BackendConstructor =
    Arc<dyn Fn(&BackendConfig) -> Result<Arc<dyn TranslationBackend>, TranslationError> + Send + Sync>;

/// Wrap a typed backend builder into a [`BackendConstructor`]
pub fn constructor<B, F>(build: F) -> BackendConstructor
where
    B: TranslationBackend + 'static,
    F: Fn(&BackendConfig) -> Result<B, TranslationError> + Send + Sync + 'static,
{
    Arc::new(move |config: &BackendConfig| -> Result<Arc<dyn TranslationBackend>, TranslationError> {
        Ok(Arc::new(build(config)?))
    })
}

/// Identity of a cached backend instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub kind: BackendKind,
    pub model: String,
    pub credential_fingerprint: String,
}

impl RegistryKey {
    pub fn for_config(config: &BackendConfig) -> Self {
        Self {
            kind: config.kind(),
            model: config.model(),
            credential_fingerprint: config.credential_fingerprint(),
        }
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.model)?;
        if !self.credential_fingerprint.is_empty() {
            write!(f, "@{}", self.credential_fingerprint)?;
        }
        Ok(())
    }
}

/// A cached backend instance
#[derive(Clone)]
pub struct RegistryEntry {
    pub key: RegistryKey,
    pub instance: Arc<dyn TranslationBackend>,
    pub last_access: Instant,
}

/// Keyed cache of validated backend instances
pub struct BackendRegistry {
    constructors: HashMap<BackendKind, BackendConstructor>,
    entries: Mutex<HashMap<RegistryKey, RegistryEntry>>,
    ttl: Duration,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .field("entries", &self.entries.lock().keys().cloned().collect::<Vec<_>>())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl BackendRegistry {
    /// Create a registry with no constructors
    pub fn new(ttl: Duration) -> Self {
        Self {
            constructors: HashMap::new(),
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a registry with the built-in HTTP backends
    pub fn with_default_backends(cache: CacheConfig, ttl: Duration) -> Self {
        let mut registry = Self::new(ttl);

        let ollama_cache = cache.clone();
        registry.register(BackendKind::Ollama, constructor(move |config| OllamaBackend::new(config, &ollama_cache)));

        for kind in [BackendKind::OpenAI, BackendKind::LMStudio] {
            let openai_cache = cache.clone();
            registry.register(kind, constructor(move |config| OpenAiBackend::new(config, &openai_cache)));
        }

        registry.register(BackendKind::Anthropic, constructor(move |config| AnthropicBackend::new(config, &cache)));

        registry
    }

    /// Set or replace the constructor for a backend type
    pub fn register(&mut self, kind: BackendKind, constructor: BackendConstructor) {
        self.constructors.insert(kind, constructor);
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached instance for `config` or build, validate and cache a new one.
    ///
    /// The model is checked before anything is constructed. Nothing is cached
    /// when construction or validation fails.
    pub fn create_or_get(&self, config: &BackendConfig) -> Result<Arc<dyn TranslationBackend>, TranslationError> {
        let kind = config.kind();
        let model = config.model();
        if !kind.supports_model(&model) {
            return Err(TranslationError::Validation(kind.unsupported_model_message(&model)));
        }

        let key = RegistryKey::for_config(config);
        let now = Instant::now();
        {
            let mut entries = self.entries.lock();
            match entries.get_mut(&key) {
                Some(entry) if now.duration_since(entry.last_access) < self.ttl => {
                    entry.last_access = now;
                    debug!("Reusing backend {}", key);
                    return Ok(entry.instance.clone());
                }
                Some(_) => {
                    entries.remove(&key);
                    debug!("Backend {} expired, rebuilding", key);
                }
                None => {}
            }
        }

        let constructor = self.constructors.get(&kind).ok_or_else(|| {
            TranslationError::Config(format!("No constructor registered for {} backend", kind.display_name()))
        })?;
        let instance = constructor(config)?;
        instance.validate_config()?;

        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| RegistryEntry {
            key: key.clone(),
            instance,
            last_access: now,
        });
        info!("Registered backend {}", key);
        Ok(entry.instance.clone())
    }

    /// Drop entries unused for at least the TTL, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_access) < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Evicted {} idle backend(s)", removed);
        }
        removed
    }

    /// Remove an entry explicitly
    pub fn remove(&self, key: &RegistryKey) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn contains(&self, key: &RegistryKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every cached instance
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
