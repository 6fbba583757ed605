//! Durable-store integration tests.
//!
//! Run with: `cargo test -p feedgate-tests --test store_tests --features integration`
//! (requires `DATABASE_URL` pointing at a scratch PostgreSQL).

#![cfg(feature = "integration")]

use feedgate_core::dataset::{DatasetId, NaturalKey};
use feedgate_core::ports::FeedStore;
use feedgate_db::{Database, PgFeedStore};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

async fn connect() -> PgFeedStore {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");
    let db = Database::connect(&url).await.expect("Failed to connect");
    db.migrate().await.expect("Failed to migrate");
    PgFeedStore::new(db.pool().clone())
}

fn unique_bucket() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    format!("{nanos}")
}

#[tokio::test]
async fn test_upsert_get_round_trip() {
    let store = connect().await;
    let key = NaturalKey::new(DatasetId::MidTemp, "11B10101", unique_bucket());

    assert!(store.get(&key).await.expect("get").is_none());

    store
        .upsert(&key, &json!({"taMin3": 2}))
        .await
        .expect("upsert");
    let record = store.get(&key).await.expect("get").expect("record");
    assert_eq!(record.payload, json!({"taMin3": 2}));
}

#[tokio::test]
async fn test_upsert_replaces_on_conflict() {
    let store = connect().await;
    let key = NaturalKey::new(DatasetId::MidLand, "11B00000", unique_bucket());

    store
        .upsert(&key, &json!({"rnSt3Am": 30}))
        .await
        .expect("first upsert");
    store
        .upsert(&key, &json!({"rnSt3Am": 60}))
        .await
        .expect("second upsert");

    let record = store.get(&key).await.expect("get").expect("record");
    assert_eq!(record.payload, json!({"rnSt3Am": 60}));
}
