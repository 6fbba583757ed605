//! Environment-based settings.
//!
//! Every knob the policy layer treats as externally supplied lives
//! here: credentials, backend URLs, per-dataset TTLs, publication-lag
//! buffers, and the strict-cache flag. Loaded from `FEEDGATE_`-prefixed
//! environment variables.

use feedgate_core::dataset::{DatasetId, DatasetPolicy};
use feedgate_core::{Error, Result};
use feedgate_upstream::energy::{DEFAULT_GAS_DATASET_URL, DEFAULT_POWER_BASE};
use feedgate_upstream::air::DEFAULT_AIR_BASE;
use feedgate_upstream::weather::DEFAULT_WEATHER_BASE;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// PostgreSQL URL for the durable store; absent disables it.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Redis URL for the ephemeral cache; absent disables it.
    #[serde(default)]
    pub redis_url: Option<String>,

    // Provider credentials. Absence is surfaced as a ConfigMissing error
    // at the first call needing one, before any network I/O.
    #[serde(default)]
    pub weather_auth_key: Option<String>,
    #[serde(default)]
    pub air_service_key: Option<String>,
    #[serde(default)]
    pub odcloud_service_key: Option<String>,
    #[serde(default)]
    pub power_api_key: Option<String>,

    #[serde(default)]
    pub kpx_dataset_url: Option<String>,
    #[serde(default = "default_gas_dataset_url")]
    pub gas_dataset_url: String,

    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    #[serde(default = "default_air_base_url")]
    pub air_base_url: String,
    #[serde(default = "default_power_base_url")]
    pub power_base_url: String,

    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    // Per-dataset TTLs, tuned to each provider's republication cadence.
    #[serde(default = "default_ultra_ttl")]
    pub ultra_ttl_seconds: u64,
    #[serde(default = "default_short_ttl")]
    pub short_ttl_seconds: u64,
    #[serde(default = "default_dust_ttl")]
    pub dust_ttl_seconds: u64,
    #[serde(default = "default_kpx_ttl")]
    pub kpx_ttl_seconds: u64,

    // Publication-lag buffers, minutes subtracted before bucket
    // resolution.
    #[serde(default = "default_ultra_buffer")]
    pub ultra_buffer_minutes: i64,
    #[serde(default = "default_short_buffer")]
    pub short_buffer_minutes: i64,

    /// Propagate cache-backend failures instead of degrading to misses.
    #[serde(default)]
    pub cache_strict: bool,

    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_seconds: u64,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_gas_dataset_url() -> String {
    DEFAULT_GAS_DATASET_URL.to_string()
}

fn default_weather_base_url() -> String {
    DEFAULT_WEATHER_BASE.to_string()
}

fn default_air_base_url() -> String {
    DEFAULT_AIR_BASE.to_string()
}

fn default_power_base_url() -> String {
    DEFAULT_POWER_BASE.to_string()
}

fn default_cache_prefix() -> String {
    "feedgate".to_string()
}

fn default_ultra_ttl() -> u64 {
    600
}

fn default_short_ttl() -> u64 {
    3600
}

fn default_dust_ttl() -> u64 {
    1800
}

fn default_kpx_ttl() -> u64 {
    600
}

fn default_ultra_buffer() -> i64 {
    40
}

fn default_short_buffer() -> i64 {
    20
}

fn default_upstream_timeout() -> u64 {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database_url: None,
            redis_url: None,
            weather_auth_key: None,
            air_service_key: None,
            odcloud_service_key: None,
            power_api_key: None,
            kpx_dataset_url: None,
            gas_dataset_url: default_gas_dataset_url(),
            weather_base_url: default_weather_base_url(),
            air_base_url: default_air_base_url(),
            power_base_url: default_power_base_url(),
            cache_prefix: default_cache_prefix(),
            ultra_ttl_seconds: default_ultra_ttl(),
            short_ttl_seconds: default_short_ttl(),
            dust_ttl_seconds: default_dust_ttl(),
            kpx_ttl_seconds: default_kpx_ttl(),
            ultra_buffer_minutes: default_ultra_buffer(),
            short_buffer_minutes: default_short_buffer(),
            cache_strict: false,
            upstream_timeout_seconds: default_upstream_timeout(),
        }
    }
}

impl Settings {
    /// Load from `FEEDGATE_*` environment variables.
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("FEEDGATE"))
            .build()
            .map_err(|e| Error::ConfigInvalid {
                name: "environment".into(),
                message: e.to_string(),
            })?;
        cfg.try_deserialize().map_err(|e| Error::ConfigInvalid {
            name: "environment".into(),
            message: e.to_string(),
        })
    }

    /// Per-dataset resolution policies derived from the settings.
    pub fn policies(&self) -> DatasetPolicies {
        DatasetPolicies {
            ultra: DatasetPolicy::cached(DatasetId::UltraNowcast, self.ultra_ttl_seconds)
                .with_strict_cache(self.cache_strict),
            short: DatasetPolicy::cached(DatasetId::ShortForecast, self.short_ttl_seconds)
                .with_strict_cache(self.cache_strict),
            mid_land: DatasetPolicy::stored(DatasetId::MidLand),
            mid_temp: DatasetPolicy::stored(DatasetId::MidTemp),
            dust: DatasetPolicy::cached(DatasetId::Dust, self.dust_ttl_seconds)
                .with_strict_cache(self.cache_strict),
            kpx: DatasetPolicy::cached(DatasetId::KpxNow, self.kpx_ttl_seconds)
                .with_strict_cache(self.cache_strict),
        }
    }
}

/// The resolved policy set, one entry per resolver-backed dataset.
#[derive(Debug, Clone)]
pub struct DatasetPolicies {
    pub ultra: DatasetPolicy,
    pub short: DatasetPolicy,
    pub mid_land: DatasetPolicy,
    pub mid_temp: DatasetPolicy,
    pub dust: DatasetPolicy,
    pub kpx: DatasetPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policies() {
        let settings = Settings::default();
        let policies = settings.policies();

        assert!(policies.ultra.use_cache);
        assert!(!policies.ultra.use_store);
        assert_eq!(policies.ultra.ttl_seconds, 600);

        assert!(policies.mid_land.use_store);
        assert!(policies.mid_land.retry_previous_bucket);
        assert!(!policies.mid_land.use_cache);

        assert_eq!(policies.dust.ttl_seconds, 1800);
        assert!(!policies.dust.strict_cache);
    }

    #[test]
    fn test_strict_flag_reaches_policies() {
        let settings = Settings {
            cache_strict: true,
            ..Settings::default()
        };
        assert!(settings.policies().kpx.strict_cache);
    }
}
