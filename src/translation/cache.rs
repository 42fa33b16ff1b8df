/*!
 * Translation caching functionality.
 *
 * A bounded map with time-based logical expiry. Expired entries are removed
 * lazily when they are touched; when the map is full the entry with the
 * oldest timestamp is evicted to make room. Eviction follows insertion time,
 * not read time.
 */

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::TranslationError;
use crate::resource::ContentClass;

/// Values and keys stored in a [`TtlCache`] must not be empty
pub trait CacheItem {
    fn is_empty_item(&self) -> bool;
}

impl CacheItem for String {
    fn is_empty_item(&self) -> bool {
        self.is_empty()
    }
}

/// Cache key for a single-text translation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Source text to translate
    pub source_text: String,

    /// Source language code
    pub source_language: String,

    /// Target language code
    pub target_language: String,

    /// Semantic context label, part of the key so that identical text in
    /// different contexts is cached separately
    pub context: Option<String>,

    pub content_class: Option<ContentClass>,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            context: None,
            content_class: None,
        }
    }

    pub fn with_context(mut self, context: Option<&str>) -> Self {
        self.context = context.map(str::to_string);
        self
    }

    pub fn with_content_class(mut self, content_class: Option<ContentClass>) -> Self {
        self.content_class = content_class;
        self
    }
}

impl CacheItem for CacheKey {
    fn is_empty_item(&self) -> bool {
        self.source_text.is_empty() || self.source_language.is_empty() || self.target_language.is_empty()
    }
}

/// Stored value with its insertion time
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub timestamp: Instant,
}

#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    hits: usize,
    misses: usize,
}

/// Bounded cache with TTL expiry and oldest-first eviction
#[derive(Debug)]
pub struct TtlCache<K, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + CacheItem,
    V: Clone + CacheItem,
{
    /// Create a new cache; `capacity` and `ttl` must both be non-zero
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, TranslationError> {
        if capacity == 0 {
            return Err(TranslationError::Config("Cache capacity must be greater than zero".to_string()));
        }
        if ttl.is_zero() {
            return Err(TranslationError::Config("Cache TTL must be greater than zero".to_string()));
        }

        Ok(Self {
            state: Arc::new(Mutex::new(CacheState { entries: HashMap::new(), hits: 0, misses: 0 })),
            capacity,
            ttl,
        })
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.duration_since(entry.timestamp) > self.ttl
    }

    /// Get a live value, removing it if it has expired
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            Some(entry) if !self.is_expired(entry, now) => {
                let value = entry.value.clone();
                state.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.remove(key);
            debug!("Cache entry expired");
        }
        state.misses += 1;
        None
    }

    /// Insert or refresh a value
    pub fn set(&self, key: K, value: V) -> Result<(), TranslationError> {
        if key.is_empty_item() {
            return Err(TranslationError::Validation("Cache key must not be empty".to_string()));
        }
        if value.is_empty_item() {
            return Err(TranslationError::Validation("Cache value must not be empty".to_string()));
        }

        let now = Instant::now();
        let mut state = self.state.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                debug!("Cache full ({} entries), evicted oldest entry", self.capacity);
            }
        }

        state.entries.insert(key, CacheEntry { value, timestamp: now });
        Ok(())
    }

    /// Get cache statistics as `(hits, misses, hit_rate)`
    pub fn stats(&self) -> (usize, usize, f64) {
        let state = self.state.lock();
        let total = state.hits + state.misses;
        let hit_rate = if total > 0 { state.hits as f64 / total as f64 } else { 0.0 };
        (state.hits, state.misses, hit_rate)
    }

    /// Clear all entries and counters
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        debug!("Translation cache cleared");
    }

    /// Number of physically stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<K, V> Default for TtlCache<K, V> {
    /// 1000 entries kept for one hour
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState { entries: HashMap::new(), hits: 0, misses: 0 })),
            capacity: 1000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }
}
