//! In-memory collaborators and sample provider payloads.

use async_trait::async_trait;
use feedgate_core::dataset::NaturalKey;
use feedgate_core::ports::{FeedStore, StoreRecord};
use feedgate_core::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory FeedStore with an upsert counter, for asserting
/// read-through idempotence.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<NaturalKey, Value>>,
    upserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().expect("store lock").len()
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
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

/// Hourly nowcast payload in the provider's item-per-category shape.
pub fn ultra_nowcast_body() -> Value {
    json!({"response": {"header": {"resultCode": "00", "resultMsg": "OK"}, "body": {"items": {"item": [
        {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "T1H", "obsrValue": "3.5"},
        {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "REH", "obsrValue": "40"},
        {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "RN1", "obsrValue": "0"},
        {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "PTY", "obsrValue": "0"},
        {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "WSD", "obsrValue": "1.9"},
        {"baseDate": "20250310", "baseTime": "1100", "nx": 60, "ny": 127, "category": "VEC", "obsrValue": "250"}
    ]}}}})
}

/// Weather-hub body carrying an embedded provider failure.
pub fn provider_error_body() -> Value {
    json!({"response": {"header": {"resultCode": "03", "resultMsg": "NO_DATA"}}})
}

/// Mid-range temperature forecast payload.
pub fn mid_temp_body() -> Value {
    json!({"response": {"header": {"resultCode": "00", "resultMsg": "OK"}, "body": {"items": {"item": [
        {"regId": "11B10101", "taMin3": 2, "taMax3": 12, "taMin4": 1, "taMax4": 10}
    ]}}}})
}

/// Mid-range land forecast payload.
pub fn mid_land_body() -> Value {
    json!({"response": {"header": {"resultCode": "00", "resultMsg": "OK"}, "body": {"items": {"item": [
        {"regId": "11B00000", "rnSt3Am": 30, "rnSt3Pm": 20, "wf3Am": "구름많음"}
    ]}}}})
}

/// Dust forecast-dispatch XML for 2025-03-10.
pub fn dust_forecast_xml() -> &'static str {
    "<response><body><items>\
     <item><dataTime>2025-03-10 11시 발표</dataTime>\
     <informData>2025-03-10</informData>\
     <informGrade>서울 : 보통, 인천 : 나쁨</informGrade></item>\
     </items></body></response>"
}

/// Realtime measurement rows for the dust endpoints.
pub fn dust_realtime_body() -> Value {
    json!({"response": {"body": {"items": [
        {"stationName": "중구", "dataTime": "2025-03-10 11:00", "pm10Value": "31", "pm25Value": "18"},
        {"stationName": "종로구", "dataTime": "2025-03-10 11:00", "pm10Value": "45", "pm25Value": "22"}
    ]}}})
}

/// Power-exchange pricing rows in the odcloud paged shape.
pub fn kpx_body() -> Value {
    json!({"page": 1, "perPage": 10, "totalCount": 1, "data": [
        {"tradeTime": "2025-03-10 11:05", "price": 91.2}
    ]})
}

/// City-gas annual statistics in the odcloud paged shape.
pub fn gas_body() -> Value {
    json!({"page": 1, "perPage": 200, "totalCount": 1, "data": [
        {"year": 2024, "sido": "Seoul", "sales": 1234567}
    ]})
}
