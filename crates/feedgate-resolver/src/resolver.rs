//! The read-through resolver.

use feedgate_core::dataset::{DatasetPolicy, DatasetRequest, NaturalKey};
use feedgate_core::envelope::{Envelope, Source};
use feedgate_core::keys::derive_key;
use feedgate_core::ports::{FeedCache, FeedStore};
use feedgate_core::schedule::TimeBucket;
use feedgate_core::Result;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one resolution, before envelope shaping.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub source: Source,
    pub payload: Value,
    pub cache_key: Option<String>,
    pub ttl: Option<u64>,
    /// The bucket actually served, fallback-aware. `None` for datasets
    /// without a publication schedule.
    pub bucket: Option<TimeBucket>,
}

impl Resolution {
    pub fn into_envelope(self) -> Envelope {
        Envelope {
            source: self.source,
            data: self.payload,
            cache_key: self.cache_key,
            ttl: self.ttl,
        }
    }
}

/// The resolution policy, holding the storage collaborators. Which of
/// them a given request consults is decided by the dataset's
/// [`DatasetPolicy`]; the durable store always takes precedence on read.
#[derive(Clone)]
pub struct ReadThrough {
    store: Option<Arc<dyn FeedStore>>,
    cache: Option<Arc<dyn FeedCache>>,
    key_prefix: String,
}

impl ReadThrough {
    pub fn new(
        store: Option<Arc<dyn FeedStore>>,
        cache: Option<Arc<dyn FeedCache>>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            key_prefix: key_prefix.into(),
        }
    }

    /// Resolve a request: store → cache → upstream → write-through.
    ///
    /// `fetch` is invoked with the bucket to request upstream; on an
    /// upstream failure it is invoked once more with `fallback` when the
    /// dataset policy allows it. Every successful payload is written
    /// through.
    pub async fn resolve<F, Fut>(
        &self,
        policy: &DatasetPolicy,
        request: &DatasetRequest,
        region_key: Option<&str>,
        bucket: Option<TimeBucket>,
        fallback: Option<TimeBucket>,
        fetch: F,
    ) -> Result<Resolution>
    where
        F: Fn(Option<TimeBucket>) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        self.resolve_filtered(policy, request, region_key, bucket, fallback, fetch, |_| true)
            .await
    }

    /// [`ReadThrough::resolve`] with a write-through predicate: only
    /// payloads the predicate accepts are persisted or cached. Composite
    /// endpoints use this to keep partial results out of the cache while
    /// still returning them.
    #[allow(clippy::too_many_arguments)]
    pub async fn resolve_filtered<F, Fut, P>(
        &self,
        policy: &DatasetPolicy,
        request: &DatasetRequest,
        region_key: Option<&str>,
        bucket: Option<TimeBucket>,
        fallback: Option<TimeBucket>,
        fetch: F,
        write_through: P,
    ) -> Result<Resolution>
    where
        F: Fn(Option<TimeBucket>) -> Fut,
        Fut: Future<Output = Result<Value>>,
        P: Fn(&Value) -> bool,
    {
        // 1. Durable lookup. Store errors propagate: it is the
        //    authoritative layer.
        if policy.use_store {
            if let (Some(store), Some(b)) = (&self.store, &bucket) {
                let key = self.natural_key(policy, region_key, b);
                if let Some(record) = store.get(&key).await? {
                    debug!(dataset = %policy.dataset, key = %key, "serving from store");
                    return Ok(Resolution {
                        source: Source::Db,
                        payload: record.payload,
                        cache_key: None,
                        ttl: None,
                        bucket: Some(b.clone()),
                    });
                }
            }
        }

        // 2. Cache lookup. Backend failure degrades to a miss unless the
        //    dataset is configured strict.
        let cache_key = policy
            .use_cache
            .then(|| derive_key(&self.key_prefix, request));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            match cache.get(key).await {
                Ok(Some(payload)) => {
                    let ttl = match cache.ttl(key).await {
                        Ok(ttl) => ttl,
                        Err(err) if policy.strict_cache => return Err(err),
                        Err(err) => {
                            warn!(key, error = %err, "cache ttl probe failed");
                            None
                        }
                    };
                    debug!(dataset = %policy.dataset, key, "serving from cache");
                    return Ok(Resolution {
                        source: Source::Cache,
                        payload,
                        cache_key: cache_key.clone(),
                        ttl,
                        bucket: bucket.clone(),
                    });
                }
                Ok(None) => {}
                Err(err) if policy.strict_cache => return Err(err),
                Err(err) => {
                    warn!(key, error = %err, "cache lookup failed; treating as miss");
                }
            }
        }

        // 3. Upstream fetch, with at most one fallback-bucket retry.
        let mut used_bucket = bucket;
        let payload = match fetch(used_bucket.clone()).await {
            Ok(payload) => payload,
            Err(err)
                if err.is_upstream() && policy.retry_previous_bucket && fallback.is_some() =>
            {
                warn!(
                    dataset = %policy.dataset,
                    error = %err,
                    "upstream fetch failed; retrying previous bucket"
                );
                let payload = fetch(fallback.clone()).await?;
                used_bucket = fallback;
                payload
            }
            Err(err) => return Err(err),
        };

        // 4. Write-through, keyed by the bucket that actually served.
        let cacheable = write_through(&payload);
        let mut stored = false;
        if policy.use_store && cacheable {
            if let (Some(store), Some(b)) = (&self.store, &used_bucket) {
                let key = self.natural_key(policy, region_key, b);
                store.upsert(&key, &payload).await?;
                stored = true;
            }
        }

        let mut ttl = None;
        if cacheable {
            if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
                match cache.set(key, &payload, policy.ttl_seconds).await {
                    Ok(()) => ttl = Some(policy.ttl_seconds),
                    Err(err) if policy.strict_cache => return Err(err),
                    Err(err) => {
                        warn!(key, error = %err, "cache write-through failed");
                    }
                }
            }
        }

        Ok(Resolution {
            source: if stored { Source::ApiDb } else { Source::Api },
            payload,
            cache_key,
            ttl,
            bucket: used_bucket,
        })
    }

    fn natural_key(
        &self,
        policy: &DatasetPolicy,
        region_key: Option<&str>,
        bucket: &TimeBucket,
    ) -> NaturalKey {
        NaturalKey::new(policy.dataset, region_key.unwrap_or_default(), bucket.stamp())
    }
}
