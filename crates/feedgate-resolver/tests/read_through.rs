//! Protocol tests for the read-through resolver, against in-memory
//! collaborators.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use feedgate_core::dataset::{DatasetId, DatasetPolicy, DatasetRequest, NaturalKey};
use feedgate_core::envelope::Source;
use feedgate_core::ports::{FeedCache, FeedStore, StoreRecord};
use feedgate_core::schedule::TimeBucket;
use feedgate_core::{Error, Result};
use feedgate_resolver::ReadThrough;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MemStore {
    records: Mutex<HashMap<NaturalKey, Value>>,
    upserts: AtomicUsize,
}

#[async_trait]
impl FeedStore for MemStore {
    async fn get(&self, key: &NaturalKey) -> Result<Option<StoreRecord>> {
        let records = self.records.lock().expect("store lock");
        Ok(records.get(key).map(|payload| StoreRecord {
            key: key.clone(),
            payload: payload.clone(),
            created_at: chrono::Utc::now(),
        }))
    }

    async fn upsert(&self, key: &NaturalKey, payload: &Value) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().expect("store lock");
        records.insert(key.clone(), payload.clone());
        Ok(())
    }
}

#[derive(Default)]
struct MemCache {
    entries: Mutex<HashMap<String, (Value, u64)>>,
}

#[async_trait]
impl FeedCache for MemCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().expect("cache lock");
        Ok(entries.get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> Result<()> {
        let mut entries = self.entries.lock().expect("cache lock");
        entries.insert(key.to_string(), (value.clone(), ttl_seconds));
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let entries = self.entries.lock().expect("cache lock");
        Ok(entries.get(key).map(|(_, ttl)| *ttl))
    }
}

/// Cache whose backend is unreachable.
struct DownCache;

#[async_trait]
impl FeedCache for DownCache {
    async fn get(&self, _key: &str) -> Result<Option<Value>> {
        Err(Error::Cache("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &Value, _ttl_seconds: u64) -> Result<()> {
        Err(Error::Cache("connection refused".into()))
    }

    async fn ttl(&self, _key: &str) -> Result<Option<u64>> {
        Err(Error::Cache("connection refused".into()))
    }
}

fn bucket(hh: u32) -> TimeBucket {
    TimeBucket::new(
        NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date"),
        NaiveTime::from_hms_opt(hh, 0, 0).expect("valid time"),
    )
}

fn request() -> DatasetRequest {
    DatasetRequest::new(DatasetId::MidTemp).with("reg_id", "11B10101")
}

#[tokio::test]
async fn test_read_through_is_idempotent() {
    let store = Arc::new(MemStore::default());
    let resolver = ReadThrough::new(Some(store.clone()), None, "test");
    let policy = DatasetPolicy::stored(DatasetId::MidTemp);
    let fetches = AtomicUsize::new(0);

    let fetch = |_b: Option<TimeBucket>| {
        fetches.fetch_add(1, Ordering::SeqCst);
        async { Ok(json!({"temp": [1, 2, 3]})) }
    };

    let first = resolver
        .resolve(&policy, &request(), Some("11B10101"), Some(bucket(6)), None, fetch)
        .await
        .expect("first resolve");
    assert_eq!(first.source, Source::ApiDb);

    let second = resolver
        .resolve(&policy, &request(), Some("11B10101"), Some(bucket(6)), None, fetch)
        .await
        .expect("second resolve");
    assert_eq!(second.source, Source::Db);
    assert_eq!(second.payload, first.payload);

    // Exactly one upstream call and one authoritative record.
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(store.upserts.load(Ordering::SeqCst), 1);
    assert_eq!(store.records.lock().expect("store lock").len(), 1);
}

#[tokio::test]
async fn test_store_takes_precedence_over_cache() {
    let store = Arc::new(MemStore::default());
    let cache = Arc::new(MemCache::default());
    let key = NaturalKey::new(DatasetId::MidTemp, "11B10101", bucket(6).stamp());
    store
        .upsert(&key, &json!({"from": "store"}))
        .await
        .expect("seed store");

    let resolver = ReadThrough::new(Some(store), Some(cache), "test");
    let mut policy = DatasetPolicy::stored(DatasetId::MidTemp);
    policy.use_cache = true;
    policy.ttl_seconds = 600;

    let resolution = resolver
        .resolve(&policy, &request(), Some("11B10101"), Some(bucket(6)), None, |_| async {
            Ok(json!({"from": "api"}))
        })
        .await
        .expect("resolve");

    assert_eq!(resolution.source, Source::Db);
    assert_eq!(resolution.payload, json!({"from": "store"}));
}

#[tokio::test]
async fn test_cache_hit_reports_key_and_ttl() {
    let cache = Arc::new(MemCache::default());
    let resolver = ReadThrough::new(None, Some(cache), "test");
    let policy = DatasetPolicy::cached(DatasetId::KpxNow, 600);
    let req = DatasetRequest::new(DatasetId::KpxNow).with("page", 1);

    let first = resolver
        .resolve(&policy, &req, None, None, None, |_| async {
            Ok(json!({"price": 91.2}))
        })
        .await
        .expect("first resolve");
    assert_eq!(first.source, Source::Api);
    assert_eq!(first.ttl, Some(600));
    let key = first.cache_key.clone().expect("cache key");

    let second = resolver
        .resolve(&policy, &req, None, None, None, |_| async {
            Ok(json!({"price": 0.0}))
        })
        .await
        .expect("second resolve");
    assert_eq!(second.source, Source::Cache);
    assert_eq!(second.payload, json!({"price": 91.2}));
    assert_eq!(second.cache_key.as_deref(), Some(key.as_str()));
    assert_eq!(second.ttl, Some(600));
}

#[tokio::test]
async fn test_cache_outage_degrades_to_miss() {
    let resolver = ReadThrough::new(None, Some(Arc::new(DownCache)), "test");
    let policy = DatasetPolicy::cached(DatasetId::UltraNowcast, 600);
    let req = DatasetRequest::new(DatasetId::UltraNowcast).with("nx", 60);

    let resolution = resolver
        .resolve(&policy, &req, None, Some(bucket(11)), None, |_| async {
            Ok(json!({"temperature_c": 3.5}))
        })
        .await
        .expect("resolve despite cache outage");

    // Payload identical to the cache-available path; only source differs.
    assert_eq!(resolution.source, Source::Api);
    assert_eq!(resolution.payload, json!({"temperature_c": 3.5}));
}

#[tokio::test]
async fn test_strict_cache_surfaces_outage() {
    let resolver = ReadThrough::new(None, Some(Arc::new(DownCache)), "test");
    let policy = DatasetPolicy::cached(DatasetId::UltraNowcast, 600).with_strict_cache(true);
    let req = DatasetRequest::new(DatasetId::UltraNowcast).with("nx", 60);

    let err = resolver
        .resolve(&policy, &req, None, Some(bucket(11)), None, |_| async {
            Ok(json!({"temperature_c": 3.5}))
        })
        .await
        .expect_err("strict mode must propagate");
    assert!(matches!(err, Error::Cache(_)));
}

#[tokio::test]
async fn test_provider_error_is_not_written_through() {
    let store = Arc::new(MemStore::default());
    let cache = Arc::new(MemCache::default());
    let resolver = ReadThrough::new(Some(store.clone()), Some(cache.clone()), "test");
    let mut policy = DatasetPolicy::stored(DatasetId::MidLand);
    policy.use_cache = true;
    policy.retry_previous_bucket = false;

    let err = resolver
        .resolve(&policy, &request(), Some("11B10101"), Some(bucket(6)), None, |_| async {
            Err(Error::ProviderResult {
                code: "03".into(),
                message: "NO_DATA".into(),
            })
        })
        .await
        .expect_err("provider failure must surface");
    assert!(matches!(err, Error::ProviderResult { .. }));
    assert_eq!(store.records.lock().expect("store lock").len(), 0);
    assert_eq!(cache.entries.lock().expect("cache lock").len(), 0);
}

#[tokio::test]
async fn test_fallback_bucket_retry() {
    let store = Arc::new(MemStore::default());
    let resolver = ReadThrough::new(Some(store.clone()), None, "test");
    let policy = DatasetPolicy::stored(DatasetId::MidLand);
    let primary = bucket(18);
    let mut fallback = bucket(6);
    fallback.is_fallback = true;

    let resolution = resolver
        .resolve(
            &policy,
            &request(),
            Some("11B10101"),
            Some(primary),
            Some(fallback.clone()),
            |b: Option<TimeBucket>| async move {
                match b {
                    Some(b) if b.is_fallback => Ok(json!({"from": "fallback"})),
                    _ => Err(Error::UpstreamStatus {
                        status: 500,
                        body: "not yet published".into(),
                    }),
                }
            },
        )
        .await
        .expect("fallback resolve");

    assert_eq!(resolution.source, Source::ApiDb);
    let served = resolution.bucket.expect("bucket");
    assert_eq!(served.stamp(), fallback.stamp());

    // The record is keyed under the bucket that actually served.
    let key = NaturalKey::new(DatasetId::MidLand, "11B10101", fallback.stamp());
    assert!(store.records.lock().expect("store lock").contains_key(&key));
}

#[tokio::test]
async fn test_no_fallback_without_policy() {
    let resolver = ReadThrough::new(None, None, "test");
    let mut policy = DatasetPolicy::stored(DatasetId::MidLand);
    policy.retry_previous_bucket = false;
    let fetches = AtomicUsize::new(0);

    let err = resolver
        .resolve(
            &policy,
            &request(),
            Some("11B10101"),
            Some(bucket(18)),
            Some(bucket(6)),
            |_| {
                fetches.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(Error::UpstreamTransport("timed out".into()))
                }
            },
        )
        .await
        .expect_err("must surface");
    assert!(matches!(err, Error::UpstreamTransport(_)));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_write_through_predicate_keeps_partials_out() {
    let cache = Arc::new(MemCache::default());
    let resolver = ReadThrough::new(None, Some(cache.clone()), "test");
    let policy = DatasetPolicy::cached(DatasetId::Dust, 1800);
    let req = DatasetRequest::new(DatasetId::Dust).with("date", "2025-03-10");

    let resolution = resolver
        .resolve_filtered(
            &policy,
            &req,
            None,
            None,
            None,
            |_| async { Ok(json!({"ok": false, "pm10": {"ok": false}})) },
            |payload| payload.get("ok").and_then(Value::as_bool) == Some(true),
        )
        .await
        .expect("partial result still returned");

    assert_eq!(resolution.source, Source::Api);
    assert_eq!(resolution.ttl, None);
    assert_eq!(cache.entries.lock().expect("cache lock").len(), 0);
}
