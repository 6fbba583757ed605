//! Weather-hub client: hourly nowcast, short forecast, mid-range
//! land/temperature forecasts.

use crate::client::UpstreamClient;
use feedgate_core::schedule::TimeBucket;
use feedgate_core::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_WEATHER_BASE: &str = "https://apihub.kma.go.kr/api/typ02/openApi";

const ULTRA_NOWCAST_PATH: &str = "VilageFcstInfoService_2.0/getUltraSrtNcst";
const SHORT_FORECAST_PATH: &str = "VilageFcstInfoService_2.0/getVilageFcst";
const MID_LAND_PATH: &str = "MidFcstInfoService/getMidLandFcst";
const MID_TEMP_PATH: &str = "MidFcstInfoService/getMidTa";

/// Grid coordinates for the named regions served by the nowcast and
/// short-forecast endpoints.
pub struct Region {
    pub slug: &'static str,
    pub name: &'static str,
    pub nx: i64,
    pub ny: i64,
}

pub const REGIONS: &[Region] = &[
    Region { slug: "seoul", name: "Seoul", nx: 60, ny: 127 },
    Region { slug: "daejeon", name: "Daejeon", nx: 67, ny: 100 },
    Region { slug: "gwangju", name: "Gwangju", nx: 58, ny: 74 },
    Region { slug: "daegu", name: "Daegu", nx: 89, ny: 90 },
    Region { slug: "busan", name: "Busan", nx: 98, ny: 76 },
    Region { slug: "jeju", name: "Jeju", nx: 52, ny: 38 },
];

pub fn region(slug: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.slug == slug)
}

pub fn region_slugs() -> Vec<&'static str> {
    REGIONS.iter().map(|r| r.slug).collect()
}

/// Client for the weather hub. All endpoints share the `authKey`
/// credential and the `response.header.resultCode` success convention.
#[derive(Clone)]
pub struct WeatherClient {
    client: Arc<UpstreamClient>,
    base_url: String,
    auth_key: Option<String>,
}

impl WeatherClient {
    pub fn new(client: Arc<UpstreamClient>, base_url: impl Into<String>, auth_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth_key,
        }
    }

    fn auth_key(&self) -> Result<&str> {
        self.auth_key
            .as_deref()
            .ok_or_else(|| Error::ConfigMissing("FEEDGATE_WEATHER_AUTH_KEY".into()))
    }

    async fn call(&self, path: &str, mut params: Vec<(&str, String)>) -> Result<Value> {
        let auth_key = self.auth_key()?;
        params.push(("authKey", auth_key.to_string()));
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let data = self.client.get_json(&url, &params).await?;
        check_result_code(&data)?;
        Ok(data)
    }

    /// Hourly observation snapshot for a grid cell.
    pub async fn ultra_nowcast(&self, bucket: &TimeBucket, nx: i64, ny: i64) -> Result<Value> {
        self.call(
            ULTRA_NOWCAST_PATH,
            vec![
                ("pageNo", "1".into()),
                ("numOfRows", "1000".into()),
                ("dataType", "JSON".into()),
                ("base_date", bucket.base_date()),
                ("base_time", bucket.base_time()),
                ("nx", nx.to_string()),
                ("ny", ny.to_string()),
            ],
        )
        .await
    }

    /// Short-range forecast for a grid cell.
    pub async fn short_forecast(&self, bucket: &TimeBucket, nx: i64, ny: i64) -> Result<Value> {
        self.call(
            SHORT_FORECAST_PATH,
            vec![
                ("pageNo", "1".into()),
                ("numOfRows", "1000".into()),
                ("dataType", "JSON".into()),
                ("base_date", bucket.base_date()),
                ("base_time", bucket.base_time()),
                ("nx", nx.to_string()),
                ("ny", ny.to_string()),
            ],
        )
        .await
    }

    /// Mid-range land forecast for a forecast region.
    pub async fn mid_land(&self, reg_id: &str, tm_fc: &str) -> Result<Value> {
        self.call(MID_LAND_PATH, mid_params(reg_id, tm_fc)).await
    }

    /// Mid-range temperature forecast for a forecast region.
    pub async fn mid_temp(&self, reg_id: &str, tm_fc: &str) -> Result<Value> {
        self.call(MID_TEMP_PATH, mid_params(reg_id, tm_fc)).await
    }
}

fn mid_params(reg_id: &str, tm_fc: &str) -> Vec<(&'static str, String)> {
    vec![
        ("pageNo", "1".into()),
        ("numOfRows", "100".into()),
        ("dataType", "JSON".into()),
        ("regId", reg_id.to_string()),
        ("tmFc", tm_fc.to_string()),
    ]
}

/// An HTTP-200 body can still carry a provider-level failure in its
/// embedded result code; those must not be cached or stored.
fn check_result_code(data: &Value) -> Result<()> {
    let header = &data["response"]["header"];
    match header.get("resultCode").and_then(Value::as_str) {
        Some("00") | None => Ok(()),
        Some(code) => Err(Error::ProviderResult {
            code: code.to_string(),
            message: header
                .get("resultMsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_code_ok() {
        let body = json!({"response": {"header": {"resultCode": "00", "resultMsg": "OK"}}});
        assert!(check_result_code(&body).is_ok());
    }

    #[test]
    fn test_result_code_failure() {
        let body = json!({"response": {"header": {"resultCode": "03", "resultMsg": "NO_DATA"}}});
        let err = check_result_code(&body).expect_err("embedded failure");
        assert!(matches!(err, Error::ProviderResult { .. }));
        assert!(err.is_upstream());
    }

    #[test]
    fn test_region_lookup() {
        let seoul = region("seoul").expect("seoul");
        assert_eq!((seoul.nx, seoul.ny), (60, 127));
        assert!(region("atlantis").is_none());
        assert_eq!(region_slugs().len(), REGIONS.len());
    }
}
