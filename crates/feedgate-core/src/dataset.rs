//! Dataset identity, per-dataset resolution policy, and request types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifies one upstream-backed dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetId {
    UltraNowcast,
    ShortForecast,
    MidLand,
    MidTemp,
    Dust,
    GasAnnual,
    PowerMonthly,
    KpxNow,
}

impl DatasetId {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetId::UltraNowcast => "ultra_nowcast",
            DatasetId::ShortForecast => "short_forecast",
            DatasetId::MidLand => "mid_land",
            DatasetId::MidTemp => "mid_temp",
            DatasetId::Dust => "dust",
            DatasetId::GasAnnual => "gas_annual",
            DatasetId::PowerMonthly => "power_monthly",
            DatasetId::KpxNow => "kpx_now",
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution policy for one dataset.
///
/// TTLs, fallback behavior, and strictness diverge per dataset upstream,
/// so they are supplied as configuration rather than hard-coded.
#[derive(Debug, Clone)]
pub struct DatasetPolicy {
    pub dataset: DatasetId,
    /// Consult and write through the durable store.
    pub use_store: bool,
    /// Consult and write through the ephemeral cache.
    pub use_cache: bool,
    /// TTL applied on cache write-through.
    pub ttl_seconds: u64,
    /// Retry a failed upstream fetch once against the previous
    /// publication bucket.
    pub retry_previous_bucket: bool,
    /// Propagate cache-backend failures instead of degrading to a miss.
    pub strict_cache: bool,
}

impl DatasetPolicy {
    /// Cache-backed dataset: ephemeral cache only, no durable store.
    pub fn cached(dataset: DatasetId, ttl_seconds: u64) -> Self {
        Self {
            dataset,
            use_store: false,
            use_cache: true,
            ttl_seconds,
            retry_previous_bucket: false,
            strict_cache: false,
        }
    }

    /// Store-backed dataset: durable store with fallback-bucket retry.
    pub fn stored(dataset: DatasetId) -> Self {
        Self {
            dataset,
            use_store: true,
            use_cache: false,
            ttl_seconds: 0,
            retry_previous_bucket: true,
            strict_cache: false,
        }
    }

    pub fn with_strict_cache(mut self, strict: bool) -> Self {
        self.strict_cache = strict;
        self
    }
}

/// A single inbound request, canonicalized.
///
/// Parameters live in a `BTreeMap` so the canonical serialization is
/// independent of insertion order at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRequest {
    pub dataset: DatasetId,
    pub params: BTreeMap<String, String>,
}

impl DatasetRequest {
    pub fn new(dataset: DatasetId) -> Self {
        Self {
            dataset,
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Canonical request signature: dataset followed by sorted `k=v`
    /// pairs. Input to cache-key derivation.
    pub fn canonical(&self) -> String {
        let mut out = String::from(self.dataset.as_str());
        out.push('?');
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        out
    }
}

/// Natural key for durable records: dataset + region/dimension key +
/// publication bucket. At most one authoritative record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub dataset: DatasetId,
    pub region_key: String,
    pub bucket: String,
}

impl NaturalKey {
    pub fn new(dataset: DatasetId, region_key: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            dataset,
            region_key: region_key.into(),
            bucket: bucket.into(),
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.dataset, self.region_key, self.bucket)
    }
}
