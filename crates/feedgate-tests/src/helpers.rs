//! Test helper functions and utilities.

use feedgate_api::{build_app, AppState, Settings};
use feedgate_core::ports::{FeedCache, FeedStore};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Settings pointing every provider at a mock upstream base URL.
pub fn test_settings(upstream_base: &str) -> Settings {
    Settings {
        weather_auth_key: Some("test-key".to_string()),
        air_service_key: Some("test-key".to_string()),
        odcloud_service_key: Some("test-key".to_string()),
        power_api_key: Some("test-key".to_string()),
        weather_base_url: upstream_base.to_string(),
        air_base_url: upstream_base.to_string(),
        power_base_url: upstream_base.to_string(),
        gas_dataset_url: format!("{upstream_base}/gas"),
        kpx_dataset_url: Some(format!("{upstream_base}/kpx")),
        ..Settings::default()
    }
}

/// Start an API server for testing and return its address.
pub async fn start_test_server(
    settings: Settings,
    store: Option<Arc<dyn FeedStore>>,
    cache: Option<Arc<dyn FeedCache>>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let state = Arc::new(AppState::new(settings, store, cache)?);
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            eprintln!("test server exited: {err}");
        }
    });

    Ok((addr, handle))
}

/// Create an HTTP client for testing.
pub fn test_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to create test client")
}

/// API test client with base URL.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
}

impl ApiTestClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            client: test_client(),
            base_url: format!("http://{}", addr),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    /// GET and parse the JSON body, asserting a 200.
    pub async fn get_json(&self, path: &str) -> anyhow::Result<serde_json::Value> {
        let response = self.get(path).await?;
        anyhow::ensure!(
            response.status().is_success(),
            "GET {} returned {}",
            path,
            response.status()
        );
        Ok(response.json().await?)
    }
}
