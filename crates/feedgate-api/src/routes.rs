//! API route definitions.

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::handlers::{dust, energy, health, weather};
use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/weather", weather_routes())
        .nest("/dust", dust_routes())
        .nest("/gas", gas_routes())
        .nest("/power", power_routes())
        .nest("/kpx", kpx_routes())
        .with_state(state)
}

fn weather_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ultra", get(weather::ultra))
        .route("/ultra/{region}", get(weather::ultra_by_region))
        .route("/short", get(weather::short))
        .route("/mid/land", get(weather::mid_land))
        .route("/mid/temp", get(weather::mid_temp))
}

fn dust_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seoul", get(dust::seoul))
        .route("/seoul/pm10", get(dust::seoul_pm10))
        .route("/seoul/pm25", get(dust::seoul_pm25))
}

fn gas_routes() -> Router<Arc<AppState>> {
    Router::new().route("/sido/year", get(energy::gas_sido_year))
}

fn power_routes() -> Router<Arc<AppState>> {
    Router::new().route("/monthly", get(energy::power_monthly))
}

fn kpx_routes() -> Router<Arc<AppState>> {
    Router::new().route("/now", get(energy::kpx_now))
}
