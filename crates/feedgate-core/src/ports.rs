//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the resolution core and
//! the storage adapters. Upstream fetches are supplied per call as
//! closures, since each endpoint binds its own provider and parameters.

use crate::dataset::NaturalKey;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A durable record, authoritative for its natural key.
#[derive(Debug, Clone)]
pub struct StoreRecord {
    pub key: NaturalKey,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// Durable store collaborator. Failures propagate to the caller: the
/// store is the authoritative layer and masking its errors would hide
/// data-integrity problems.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Fetch the authoritative record for a natural key.
    async fn get(&self, key: &NaturalKey) -> Result<Option<StoreRecord>>;

    /// Insert or replace the record for a natural key. Concurrent writes
    /// of the same key are resolved by the backend (later write wins).
    async fn upsert(&self, key: &NaturalKey, payload: &Value) -> Result<()>;
}

/// Ephemeral cache collaborator. Whether failures propagate is decided
/// by the resolver's strict-mode policy, not here: implementations
/// return honest errors.
#[async_trait]
pub trait FeedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> Result<()>;

    /// Remaining TTL for a key, where the backend tracks one.
    async fn ttl(&self, key: &str) -> Result<Option<u64>>;
}
