//! In-process TTL cache.

use async_trait::async_trait;
use feedgate_core::ports::FeedCache;
use feedgate_core::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-memory implementation of FeedCache. Expired entries are dropped
/// lazily on access; there is no size bound, matching the TTL-only
/// eviction contract.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).and_then(|entry| {
            let remaining = entry.expires_at.saturating_duration_since(Instant::now());
            (!remaining.is_zero()).then(|| remaining.as_secs())
        }))
    }
}

fn poisoned() -> feedgate_core::Error {
    feedgate_core::Error::Cache("cache lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = MemoryCache::new();
        cache
            .set("k", &json!({"v": 1}), 60)
            .await
            .expect("set");
        assert_eq!(cache.get("k").await.expect("get"), Some(json!({"v": 1})));
        assert!(cache.ttl("k").await.expect("ttl").is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MemoryCache::new();
        cache.set("k", &json!(1), 0).await.expect("set");
        assert_eq!(cache.get("k").await.expect("get"), None);
        assert_eq!(cache.ttl("k").await.expect("ttl"), None);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent").await.expect("get"), None);
        assert_eq!(cache.ttl("absent").await.expect("ttl"), None);
    }
}
