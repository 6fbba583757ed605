//! Shared HTTP client for upstream calls.

use feedgate_core::{Error, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Maximum body length echoed back in error details.
const ERROR_BODY_HEAD: usize = 500;

/// Thin wrapper around a pooled reqwest client with a fixed per-call
/// timeout. A request exceeding the timeout fails that request only.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        Ok(Self { http })
    }

    /// Low-level GET, mapping transport failures. Callers that need the
    /// raw status/URL (for structured best-effort envelopes) start here.
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        debug!(url, "upstream GET");
        self.http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| Error::UpstreamTransport(e.to_string()))
    }

    /// GET expecting a JSON body; non-success statuses become
    /// `UpstreamStatus` with a truncated body excerpt.
    pub async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        let response = self.get(url, params).await?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::UpstreamTransport(e.to_string()))
    }

    /// GET with an Authorization header, for providers that accept the
    /// credential either as a query parameter or a header.
    pub async fn get_json_authorized(
        &self,
        url: &str,
        params: &[(&str, String)],
        authorization: &str,
    ) -> Result<Value> {
        let response = self
            .http
            .get(url)
            .query(params)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| Error::UpstreamTransport(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::UpstreamTransport(e.to_string()))
    }

    /// GET expecting a text body (the air-quality forecast is XML).
    pub async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        let response = self.get(url, params).await?;
        let response = Self::check_status(response).await?;
        response
            .text()
            .await
            .map_err(|e| Error::UpstreamTransport(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::UpstreamStatus {
            status: status.as_u16(),
            body: head(&body, ERROR_BODY_HEAD),
        })
    }
}

/// First `max` characters of a body, for error excerpts.
pub fn head(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
