//! Response envelope returned to API clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which resolution path produced the payload. Truthfulness of this
/// field is part of the API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// Served from the durable store.
    #[serde(rename = "db")]
    Db,
    /// Served from the ephemeral cache.
    #[serde(rename = "cache")]
    Cache,
    /// Fetched upstream, not persisted.
    #[serde(rename = "api")]
    Api,
    /// Fetched upstream and written through to the durable store.
    #[serde(rename = "api→db")]
    ApiDb,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Source::Db => "db",
            Source::Cache => "cache",
            Source::Api => "api",
            Source::ApiDb => "api→db",
        };
        f.write_str(s)
    }
}

/// Envelope wrapping every resolved payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub source: Source,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}
