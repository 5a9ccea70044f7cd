//! Response cache for the list endpoints
//!
//! Memoisation only: entries live until [`ResponseCache::invalidate`] is
//! called, so a cached user list can be stale after a deletion until the
//! next explicit reload.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Cache key: full request URL plus a fingerprint of the token used
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub token: u64,
}

impl CacheKey {
    pub fn new(url: impl Into<String>, token: u64) -> Self {
        Self {
            url: url.into(),
            token,
        }
    }
}

/// Successful list responses, keyed by request
#[derive(Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, Value>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, Value>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("response cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Value>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!("response cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let hit = self.read_entries().get(key).cloned();
        if hit.is_some() {
            debug!(url = %key.url, "Response cache hit");
        }
        hit
    }

    pub fn insert(&self, key: CacheKey, value: Value) {
        self.write_entries().insert(key, value);
    }

    /// Drop every cached response
    pub fn invalidate(&self) {
        let mut entries = self.write_entries();
        debug!(entries = entries.len(), "Invalidating response cache");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_get_invalidate() {
        let cache = ResponseCache::new();
        let key = CacheKey::new("https://h/manage/organizations/1/projects", 7);

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), json!([{"id": "p1", "name": "Alpha"}]));
        assert_eq!(cache.get(&key).unwrap()[0]["name"], "Alpha");
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_token_is_part_of_key() {
        let cache = ResponseCache::new();
        let url = "https://h/manage/projects/p1/users";
        cache.insert(CacheKey::new(url, 1), json!([]));

        assert!(cache.get(&CacheKey::new(url, 1)).is_some());
        assert!(cache.get(&CacheKey::new(url, 2)).is_none());
    }
}
