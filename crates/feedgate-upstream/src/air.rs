//! Air-quality service client: dust forecast grades (XML) and realtime
//! station measurements (JSON).

use crate::client::UpstreamClient;
use crate::normalize;
use feedgate_core::{Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_AIR_BASE: &str = "https://apis.data.go.kr/B552584/ArpltnInforInqireSvc";

const FORECAST_PATH: &str = "getMinuDustFrcstDspth";
const REALTIME_PATH: &str = "getCtprvnRltmMesureDnsty";

/// Province name the composite endpoints aggregate over. The provider
/// keys regions by their native names.
pub const SIDO_SEOUL: &str = "서울";

/// Particulate kind served by the dust endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DustKind {
    Pm10,
    Pm25,
}

impl DustKind {
    /// Provider code (`InformCode` parameter).
    pub fn code(&self) -> &'static str {
        match self {
            DustKind::Pm10 => "PM10",
            DustKind::Pm25 => "PM25",
        }
    }

    /// Field carrying this kind's value in realtime measurement rows.
    pub fn value_field(&self) -> &'static str {
        match self {
            DustKind::Pm10 => "pm10Value",
            DustKind::Pm25 => "pm25Value",
        }
    }

    /// Lowercase label used as the response field name.
    pub fn label(&self) -> &'static str {
        match self {
            DustKind::Pm10 => "pm10",
            DustKind::Pm25 => "pm25",
        }
    }
}

/// Client for the air-quality service. Credential is the `serviceKey`
/// query parameter.
#[derive(Clone)]
pub struct AirClient {
    client: Arc<UpstreamClient>,
    base_url: String,
    service_key: Option<String>,
}

impl AirClient {
    pub fn new(client: Arc<UpstreamClient>, base_url: impl Into<String>, service_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            service_key,
        }
    }

    fn service_key(&self) -> Result<&str> {
        self.service_key
            .as_deref()
            .ok_or_else(|| Error::ConfigMissing("FEEDGATE_AIR_SERVICE_KEY".into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Raw forecast-dispatch XML for a date and particulate kind.
    pub async fn dust_forecast_xml(&self, search_date: &str, kind: DustKind) -> Result<String> {
        let service_key = self.service_key()?;
        let params = vec![
            ("serviceKey", service_key.to_string()),
            ("searchDate", search_date.to_string()),
            ("InformCode", kind.code().to_string()),
        ];
        self.client.get_text(&self.url(FORECAST_PATH), &params).await
    }

    /// Realtime per-station measurements for a province.
    pub async fn realtime_measurements(&self, sido: &str, num_rows: u32, page_no: u32) -> Result<Value> {
        let service_key = self.service_key()?;
        let params = vec![
            ("serviceKey", service_key.to_string()),
            ("returnType", "json".to_string()),
            ("sidoName", sido.to_string()),
            ("numOfRows", num_rows.to_string()),
            ("pageNo", page_no.to_string()),
            ("ver", "1.0".to_string()),
        ];
        self.client.get_json(&self.url(REALTIME_PATH), &params).await
    }

    /// One side of the composite dust response: forecast grade plus
    /// realtime value for a single kind. Sub-fetch failures become
    /// per-field `ok:false` objects instead of request-level failures.
    pub async fn dust_side(&self, kind: DustKind, search_date: &str, station: Option<&str>) -> Value {
        let forecast = match self.dust_forecast_xml(search_date, kind).await {
            Ok(xml) => normalize::forecast_grade(&xml, search_date, SIDO_SEOUL),
            Err(err) => json!({
                "ok": false,
                "reason": "FETCH_FORECAST_ERROR",
                "error": err.to_string(),
            }),
        };

        let realtime = match self.realtime_measurements(SIDO_SEOUL, 100, 1).await {
            Ok(data) => normalize::realtime_value(&data, kind, station),
            Err(err) => json!({
                "ok": false,
                "reason": "FETCH_REALTIME_ERROR",
                "error": err.to_string(),
            }),
        };

        json!({
            "kind": kind.code(),
            "forecast": forecast,
            "realtime": realtime,
        })
    }
}
