//! Redis-backed cache provider.

use async_trait::async_trait;
use feedgate_core::ports::FeedCache;
use feedgate_core::{Error, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;

/// Redis implementation of FeedCache. Values are stored as JSON text
/// under `SETEX` semantics; the backend owns expiry.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to the backend. The connection manager reconnects on its
    /// own; individual command failures still surface per call.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Cache(e.to_string()))?;
        let conn = client.get_connection_manager().await.map_err(|e| Error::Cache(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl FeedCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await.map_err(|e| Error::Cache(e.to_string()))?;
        match raw {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> Result<()> {
        let body = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, body, ttl_seconds)
            .await
            .map_err(|e| Error::Cache(e.to_string()))?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();
        let remaining: i64 = conn.ttl(key).await.map_err(|e| Error::Cache(e.to_string()))?;
        // Redis reports -1 (no expiry) and -2 (missing) as negatives.
        Ok(u64::try_from(remaining).ok())
    }
}
