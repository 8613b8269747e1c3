//! TTL cache for embedding and chat responses

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// In-memory cache for LLM responses, bounded by TTL and entry count
pub struct LLMCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl LLMCache {
    /// Create new cache with default TTL of 1 hour
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_limits(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_limits(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl: ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Get cached value if exists and not expired
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        (Instant::now() < entry.expires_at).then(|| entry.value.clone())
    }

    /// Set cached value with default TTL
    ///
    /// A full cache first drops expired entries, then the entry closest to
    /// expiry, which is the oldest one under a shared TTL.
    pub fn set(&self, key: String, value: String) {
        let now = Instant::now();
        let expires_at = now + self.default_ttl;
        if let Ok(mut entries) = self.entries.write() {
            if !entries.contains_key(&key) && entries.len() >= self.max_entries {
                entries.retain(|_, entry| now < entry.expires_at);
                while entries.len() >= self.max_entries {
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, entry)| entry.expires_at)
                        .map(|(k, _)| k.clone());
                    match oldest {
                        Some(k) => {
                            entries.remove(&k);
                        }
                        None => break,
                    }
                }
            }
            entries.insert(key, CacheEntry { value, expires_at });
        }
    }

    pub fn stats(&self) -> CacheStats {
        match self.entries.read() {
            Ok(entries) => {
                let now = Instant::now();
                let total = entries.len();
                let expired = entries.values().filter(|e| now >= e.expires_at).count();
                CacheStats {
                    total_entries: total,
                    expired_entries: expired,
                    active_entries: total - expired,
                }
            }
            Err(_) => CacheStats::default(),
        }
    }
}

impl Default for LLMCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

fn keyed(prefix: &str, model: &str, body: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(&[0]);
    hasher.update(body.as_bytes());
    format!("{}:{}:{}", prefix, model, &hasher.finalize().to_hex()[..32])
}

/// Cache key for one embedded text
pub fn embedding_cache_key(model: &str, text: &str) -> String {
    keyed("embed", model, text)
}

/// Cache key for a serialized chat request
pub fn chat_cache_key(model: &str, messages: &str) -> String {
    keyed("chat", model, messages)
}
