//! Air-quality handlers: composite forecast-grade + realtime-value
//! responses.
//!
//! Sub-fetch failures surface as per-field `ok:false` objects rather
//! than request-level errors; partial composites are returned but never
//! written to the cache.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use feedgate_core::dataset::{DatasetId, DatasetRequest};
use feedgate_core::envelope::Envelope;
use feedgate_upstream::air::DustKind;
use feedgate_upstream::AirClient;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DustParams {
    /// `YYYY-MM-DD`; today when absent.
    #[serde(default)]
    pub date: Option<String>,
    /// Single measuring station; province-wide aggregate when absent.
    #[serde(default)]
    pub station: Option<String>,
}

pub async fn seoul(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DustParams>,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    resolve_dust(&state, "seoul", &[DustKind::Pm10, DustKind::Pm25], params).await
}

pub async fn seoul_pm10(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DustParams>,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    resolve_dust(&state, "seoul_pm10", &[DustKind::Pm10], params).await
}

pub async fn seoul_pm25(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DustParams>,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    resolve_dust(&state, "seoul_pm25", &[DustKind::Pm25], params).await
}

async fn resolve_dust(
    state: &AppState,
    endpoint: &str,
    kinds: &'static [DustKind],
    params: DustParams,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    let date = params
        .date
        .clone()
        .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());
    let request = DatasetRequest::new(DatasetId::Dust)
        .with("endpoint", endpoint)
        .with("date", &date)
        .with("station", params.station.clone().unwrap_or_default());

    let air = state.air.clone();
    let station = params.station.clone();
    let fetch_date = date.clone();
    let resolution = state
        .resolver
        .resolve_filtered(
            &state.policies.dust,
            &request,
            None,
            None,
            None,
            move |_| {
                let air = air.clone();
                let station = station.clone();
                let date = fetch_date.clone();
                async move { Ok(assemble(&air, kinds, &date, station.as_deref()).await) }
            },
            |payload| payload.get("ok").and_then(Value::as_bool) == Some(true),
        )
        .await
        .map_err(error_response)?;

    Ok(Json(resolution.into_envelope()))
}

/// Build the composite payload: one side per requested kind, collapsed
/// to a compact shape when every sub-fetch succeeded, the raw sides
/// otherwise (partial results keep full detail for debugging).
async fn assemble(air: &AirClient, kinds: &[DustKind], date: &str, station: Option<&str>) -> Value {
    let mut sides = serde_json::Map::new();
    for kind in kinds {
        sides.insert(
            kind.label().to_string(),
            air.dust_side(*kind, date, station).await,
        );
    }

    let all_ok = sides.values().all(|side| {
        side["forecast"]["ok"].as_bool() == Some(true)
            && side["realtime"]["ok"].as_bool() == Some(true)
    });

    if !all_ok {
        let mut out = json!({
            "ok": false,
            "date": date,
            "station": station,
        });
        for (label, side) in sides {
            out[label.as_str()] = side;
        }
        return out;
    }

    let first = sides.values().next().cloned().unwrap_or(Value::Null);
    let mut out = json!({
        "ok": true,
        "date": date,
        "station": station,
        "dataTime_forecast": first["forecast"]["dataTime"],
        "dataTime_realtime": first["realtime"]["dataTime"],
        "realtime_agg": station.map_or(json!("avg"), |_| Value::Null),
    });
    for (label, side) in sides {
        out[label.as_str()] = json!({
            "grade": side["forecast"]["grade"],
            "value": side["realtime"]["value"],
        });
    }
    out
}
