//! Weather feed handlers: hourly nowcast, short forecast, mid-range
//! land/temperature forecasts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Local};
use feedgate_core::dataset::{DatasetId, DatasetRequest};
use feedgate_core::envelope::{Envelope, Source};
use feedgate_core::schedule::{hourly_observation, PublicationSchedule, TimeBucket};
use feedgate_core::Error;
use feedgate_upstream::normalize;
use feedgate_upstream::weather::{region, region_slugs};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GridParams {
    #[serde(default = "default_nx")]
    pub nx: i64,
    #[serde(default = "default_ny")]
    pub ny: i64,
}

// Seoul city-hall grid cell.
fn default_nx() -> i64 {
    60
}

fn default_ny() -> i64 {
    127
}

pub async fn ultra(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GridParams>,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    resolve_ultra(&state, params.nx, params.ny)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn ultra_by_region(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    let Some(region) = region(&slug) else {
        return Err((
            StatusCode::NOT_FOUND,
            format!(
                "unsupported region '{}'; supported: {}",
                slug,
                region_slugs().join(", ")
            ),
        ));
    };
    resolve_ultra(&state, region.nx, region.ny)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn resolve_ultra(state: &AppState, nx: i64, ny: i64) -> Result<Envelope, Error> {
    let bucket = hourly_observation(
        Local::now().naive_local(),
        Duration::minutes(state.settings.ultra_buffer_minutes),
    );
    let request = DatasetRequest::new(DatasetId::UltraNowcast)
        .with("nx", nx)
        .with("ny", ny);

    let weather = state.weather.clone();
    let fetch_bucket = bucket.clone();
    let resolution = state
        .resolver
        .resolve(
            &state.policies.ultra,
            &request,
            None,
            Some(bucket),
            None,
            move |_| {
                let weather = weather.clone();
                let bucket = fetch_bucket.clone();
                async move {
                    let raw = weather.ultra_nowcast(&bucket, nx, ny).await?;
                    normalize::simplify_ultra_nowcast(&raw)
                }
            },
        )
        .await?;
    Ok(resolution.into_envelope())
}

pub async fn short(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GridParams>,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    let (nx, ny) = (params.nx, params.ny);
    let bucket = PublicationSchedule::short_forecast().resolve_current(
        Local::now().naive_local(),
        Duration::minutes(state.settings.short_buffer_minutes),
    );
    let request = DatasetRequest::new(DatasetId::ShortForecast)
        .with("nx", nx)
        .with("ny", ny);

    let weather = state.weather.clone();
    let fetch_bucket = bucket.clone();
    let resolution = state
        .resolver
        .resolve(
            &state.policies.short,
            &request,
            None,
            Some(bucket),
            None,
            move |_| {
                let weather = weather.clone();
                let bucket = fetch_bucket.clone();
                async move {
                    let raw = weather.short_forecast(&bucket, nx, ny).await?;
                    Ok(normalize::simplify_short_forecast(&raw, nx, ny))
                }
            },
        )
        .await
        .map_err(error_response)?;
    Ok(Json(resolution.into_envelope()))
}

#[derive(Deserialize)]
pub struct MidParams {
    pub reg_id: String,
    /// Explicit publication stamp (`YYYYMMDDHHMM`); resolved from the
    /// schedule when absent.
    #[serde(default)]
    pub tm_fc: Option<String>,
}

#[derive(Serialize)]
pub struct MidResponse {
    pub source: Source,
    pub reg_id: String,
    /// The publication stamp actually served, fallback-aware.
    pub tm_fc: String,
    pub data: serde_json::Value,
}

pub async fn mid_land(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MidParams>,
) -> Result<Json<MidResponse>, (StatusCode, String)> {
    resolve_mid(&state, DatasetId::MidLand, params).await
}

pub async fn mid_temp(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MidParams>,
) -> Result<Json<MidResponse>, (StatusCode, String)> {
    resolve_mid(&state, DatasetId::MidTemp, params).await
}

async fn resolve_mid(
    state: &AppState,
    dataset: DatasetId,
    params: MidParams,
) -> Result<Json<MidResponse>, (StatusCode, String)> {
    let schedule = PublicationSchedule::half_day();
    let bucket = match params.tm_fc.as_deref() {
        Some(stamp) => TimeBucket::parse_stamp(stamp).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("invalid tm_fc '{stamp}', expected YYYYMMDDHHMM"),
            )
        })?,
        None => schedule.resolve_current(Local::now().naive_local(), Duration::zero()),
    };
    let fallback = schedule.previous(&bucket);

    let request = DatasetRequest::new(dataset)
        .with("reg_id", &params.reg_id)
        .with("tm_fc", bucket.stamp());
    let policy = match dataset {
        DatasetId::MidLand => &state.policies.mid_land,
        _ => &state.policies.mid_temp,
    };

    let weather = state.weather.clone();
    let reg_id = params.reg_id.clone();
    let resolution = state
        .resolver
        .resolve(
            policy,
            &request,
            Some(params.reg_id.as_str()),
            Some(bucket),
            Some(fallback),
            move |bucket| {
                let weather = weather.clone();
                let reg_id = reg_id.clone();
                async move {
                    let Some(bucket) = bucket else {
                        return Err(Error::Internal("mid-range fetch requires a bucket".into()));
                    };
                    match dataset {
                        DatasetId::MidLand => weather.mid_land(&reg_id, &bucket.stamp()).await,
                        _ => weather.mid_temp(&reg_id, &bucket.stamp()).await,
                    }
                }
            },
        )
        .await
        .map_err(error_response)?;

    let tm_fc = resolution
        .bucket
        .as_ref()
        .map(TimeBucket::stamp)
        .unwrap_or_default();
    Ok(Json(MidResponse {
        source: resolution.source,
        reg_id: params.reg_id,
        tm_fc,
        data: resolution.payload,
    }))
}
