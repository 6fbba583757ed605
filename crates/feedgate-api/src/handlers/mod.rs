//! Request handlers organized by feed family.

pub mod dust;
pub mod energy;
pub mod health;
pub mod weather;

use axum::http::StatusCode;
use feedgate_core::Error;

/// Map a resolution error onto an HTTP response. Upstream-class
/// failures are the gateway's 502; everything else is internal.
pub fn error_response(err: Error) -> (StatusCode, String) {
    let status = if err.is_upstream() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, err.to_string())
}
