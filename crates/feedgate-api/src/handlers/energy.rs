//! Energy feed handlers: city-gas statistics, household power usage,
//! power-exchange pricing.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use feedgate_core::dataset::{DatasetId, DatasetRequest};
use feedgate_core::envelope::Envelope;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::error_response;
use crate::state::AppState;

const MAX_PER_PAGE: u32 = 1000;

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl PageParams {
    fn resolve(&self, default_per_page: u32) -> Result<(u32, u32), (StatusCode, String)> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(default_per_page);
        if page == 0 {
            return Err((StatusCode::BAD_REQUEST, "page must be >= 1".into()));
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("per_page must be between 1 and {MAX_PER_PAGE}"),
            ));
        }
        Ok((page, per_page))
    }
}

/// Annual city-gas sales statistics; paged pass-through of the upstream
/// dataset.
pub async fn gas_sido_year(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let (page, per_page) = params.resolve(200)?;
    state
        .energy
        .gas_annual(page, per_page)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Deserialize)]
pub struct PowerParams {
    pub year: i32,
    pub month: u32,
    pub metro_cd: String,
}

/// Monthly household power usage, best-effort `ok` envelope from the
/// provider client.
pub async fn power_monthly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PowerParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if !(2000..=2100).contains(&params.year) {
        return Err((StatusCode::BAD_REQUEST, "year out of range".into()));
    }
    if !(1..=12).contains(&params.month) {
        return Err((StatusCode::BAD_REQUEST, "month out of range".into()));
    }
    if params.metro_cd.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "metro_cd is required".into()));
    }

    state
        .energy
        .power_monthly(params.year, params.month, &params.metro_cd)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Power-exchange current pricing, cache read-through.
pub async fn kpx_now(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Envelope>, (StatusCode, String)> {
    let (page, per_page) = params.resolve(10)?;
    let request = DatasetRequest::new(DatasetId::KpxNow)
        .with("page", page)
        .with("per_page", per_page);

    let energy = state.energy.clone();
    let resolution = state
        .resolver
        .resolve(&state.policies.kpx, &request, None, None, None, move |_| {
            let energy = energy.clone();
            async move { energy.kpx_now(page, per_page).await }
        })
        .await
        .map_err(error_response)?;

    Ok(Json(resolution.into_envelope()))
}
