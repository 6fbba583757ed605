//! PostgreSQL implementation of FeedStore.
//!
//! One uniform strategy across every dataset: an opaque JSONB payload
//! keyed by the natural key (dataset, region_key, bucket), with
//! upsert-on-conflict resolving racing writes of the same cell.

use async_trait::async_trait;
use feedgate_core::dataset::NaturalKey;
use feedgate_core::ports::{FeedStore, StoreRecord};
use feedgate_core::{Error, Result};
use sqlx::{PgPool, Row};

/// PostgreSQL implementation of FeedStore.
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    /// Create a new PgFeedStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn get(&self, key: &NaturalKey) -> Result<Option<StoreRecord>> {
        let row = sqlx::query(
            "SELECT payload, created_at FROM feed_records \
             WHERE dataset = $1 AND region_key = $2 AND bucket = $3",
        )
        .bind(key.dataset.as_str())
        .bind(&key.region_key)
        .bind(&key.bucket)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(StoreRecord {
                key: key.clone(),
                payload: r.get("payload"),
                created_at: r.get("created_at"),
            })),
            None => Ok(None),
        }
    }

    async fn upsert(&self, key: &NaturalKey, payload: &serde_json::Value) -> Result<()> {
        sqlx::query(
            "INSERT INTO feed_records (dataset, region_key, bucket, payload, created_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (dataset, region_key, bucket) \
             DO UPDATE SET payload = EXCLUDED.payload, created_at = now()",
        )
        .bind(key.dataset.as_str())
        .bind(&key.region_key)
        .bind(&key.bucket)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;

        Ok(())
    }
}
