//! The compiled-template cache contract.
//!
//! The core only requires effectively-atomic per-key `has`/`get`/`set`;
//! persistence strategy belongs to the host. Keys are sanitized template
//! identifiers, payloads are the serialized artifact text.

use std::collections::HashMap;
use std::sync::Mutex;

/// Storage backend for compiled artifacts.
pub trait TemplateCache: Send + Sync {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, payload: &str);
}

/// An in-memory cache for tests, warmup runs and single-process hosts.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCache for MemoryCache {
    fn has(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, payload: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), payload.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_contract() {
        let cache = MemoryCache::new();
        assert!(!cache.has("k"));
        assert_eq!(cache.get("k"), None);
        cache.set("k", "payload");
        assert!(cache.has("k"));
        assert_eq!(cache.get("k"), Some("payload".to_string()));
        cache.set("k", "replaced");
        assert_eq!(cache.get("k"), Some("replaced".to_string()));
    }
}
