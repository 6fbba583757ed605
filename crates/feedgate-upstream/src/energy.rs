//! Energy dataset clients: odcloud paged datasets (city gas, power
//! exchange) and the utility power-usage statistics endpoint.

use crate::client::{head, UpstreamClient};
use feedgate_core::{Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_POWER_BASE: &str = "https://bigdata.kepco.co.kr/openapi/v1/powerUsage";

pub const DEFAULT_GAS_DATASET_URL: &str =
    "https://api.odcloud.kr/api/15040818/v1/uddi:0873d163-4ed7-49f9-bf95-8eb5c7e35fad";

const POWER_HOUSE_AVE_PATH: &str = "houseAve.do";

/// Client for the energy providers.
#[derive(Clone)]
pub struct EnergyClient {
    client: Arc<UpstreamClient>,
    odcloud_service_key: Option<String>,
    gas_dataset_url: String,
    kpx_dataset_url: Option<String>,
    power_base_url: String,
    power_api_key: Option<String>,
}

impl EnergyClient {
    pub fn new(
        client: Arc<UpstreamClient>,
        odcloud_service_key: Option<String>,
        gas_dataset_url: impl Into<String>,
        kpx_dataset_url: Option<String>,
        power_base_url: impl Into<String>,
        power_api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            odcloud_service_key,
            gas_dataset_url: gas_dataset_url.into(),
            kpx_dataset_url,
            power_base_url: power_base_url.into(),
            power_api_key,
        }
    }

    /// odcloud call. Some datasets expect the credential as a query
    /// parameter, others as an Authorization header; both are sent.
    async fn odcloud(&self, url: &str, page: u32, per_page: u32) -> Result<Value> {
        let service_key = self
            .odcloud_service_key
            .as_deref()
            .ok_or_else(|| Error::ConfigMissing("FEEDGATE_ODCLOUD_SERVICE_KEY".into()))?;
        let params = vec![
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
            ("returnType", "JSON".to_string()),
            ("serviceKey", service_key.to_string()),
        ];
        self.client
            .get_json_authorized(url, &params, service_key)
            .await
    }

    /// Annual city-gas sales statistics, paged.
    pub async fn gas_annual(&self, page: u32, per_page: u32) -> Result<Value> {
        self.odcloud(&clean_url(&self.gas_dataset_url), page, per_page)
            .await
    }

    /// Power-exchange current pricing, paged.
    pub async fn kpx_now(&self, page: u32, per_page: u32) -> Result<Value> {
        let url = self
            .kpx_dataset_url
            .as_deref()
            .ok_or_else(|| Error::ConfigMissing("FEEDGATE_KPX_DATASET_URL".into()))?;
        self.odcloud(&clean_url(url), page, per_page).await
    }

    /// Monthly household average power usage for a metro code.
    ///
    /// Best-effort envelope: provider-side failures come back as
    /// `ok:false` with the credential redacted from the echoed URL, so
    /// callers can surface diagnostics without a request-level failure.
    pub async fn power_monthly(&self, year: i32, month: u32, metro_cd: &str) -> Result<Value> {
        let api_key = self
            .power_api_key
            .as_deref()
            .ok_or_else(|| Error::ConfigMissing("FEEDGATE_POWER_API_KEY".into()))?;
        let url = format!(
            "{}/{}",
            self.power_base_url.trim_end_matches('/'),
            POWER_HOUSE_AVE_PATH
        );
        let params = vec![
            ("year", year.to_string()),
            ("month", month.to_string()),
            ("metroCd", metro_cd.to_string()),
            ("returnType", "json".to_string()),
            ("apiKey", api_key.to_string()),
        ];

        let response = self.client.get(&url, &params).await?;
        let status = response.status();
        let echoed_url = response.url().to_string().replace(api_key, "***");
        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamTransport(e.to_string()))?;

        if status.is_success() {
            return Ok(match serde_json::from_str::<Value>(&body) {
                Ok(data) => json!({"ok": true, "provider": "KEPCO", "data": data}),
                Err(_) => json!({"ok": true, "provider": "KEPCO", "raw": head(&body, 2000)}),
            });
        }

        Ok(json!({
            "ok": false,
            "provider": "KEPCO",
            "request_url": echoed_url,
            "status_code": status.as_u16(),
            "text_head": head(&body, 500),
        }))
    }
}

/// Dataset URLs arrive via environment and sometimes keep their shell
/// quoting; strip it.
fn clean_url(url: &str) -> String {
    let trimmed = url.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        })
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_strips_quotes() {
        assert_eq!(clean_url("\"https://x/y\""), "https://x/y");
        assert_eq!(clean_url("'https://x/y' "), "https://x/y");
        assert_eq!(clean_url("https://x/y"), "https://x/y");
    }
}
