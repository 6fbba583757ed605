//! Application state shared across handlers.

use crate::config::{DatasetPolicies, Settings};
use feedgate_core::ports::{FeedCache, FeedStore};
use feedgate_core::Result;
use feedgate_resolver::ReadThrough;
use feedgate_upstream::{AirClient, EnergyClient, UpstreamClient, WeatherClient};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers. Storage collaborators
/// are injected as trait objects; the upstream clients share one pooled
/// HTTP client with the configured per-call timeout.
pub struct AppState {
    pub settings: Settings,
    pub policies: DatasetPolicies,
    pub resolver: ReadThrough,
    pub weather: Arc<WeatherClient>,
    pub air: Arc<AirClient>,
    pub energy: Arc<EnergyClient>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Option<Arc<dyn FeedStore>>,
        cache: Option<Arc<dyn FeedCache>>,
    ) -> Result<Self> {
        let client = Arc::new(UpstreamClient::new(Duration::from_secs(
            settings.upstream_timeout_seconds,
        ))?);

        let weather = Arc::new(WeatherClient::new(
            client.clone(),
            settings.weather_base_url.clone(),
            settings.weather_auth_key.clone(),
        ));
        let air = Arc::new(AirClient::new(
            client.clone(),
            settings.air_base_url.clone(),
            settings.air_service_key.clone(),
        ));
        let energy = Arc::new(EnergyClient::new(
            client,
            settings.odcloud_service_key.clone(),
            settings.gas_dataset_url.clone(),
            settings.kpx_dataset_url.clone(),
            settings.power_base_url.clone(),
            settings.power_api_key.clone(),
        ));

        let resolver = ReadThrough::new(store, cache, settings.cache_prefix.clone());
        let policies = settings.policies();

        Ok(Self {
            settings,
            policies,
            resolver,
            weather,
            air,
            energy,
        })
    }
}
