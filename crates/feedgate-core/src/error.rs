//! Error types for Feedgate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("Missing required setting: {0}")]
    ConfigMissing(String),

    #[error("Invalid setting {name}: {message}")]
    ConfigInvalid { name: String, message: String },

    // Upstream errors
    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream request failed: {0}")]
    UpstreamTransport(String),

    #[error("Provider reported result {code}: {message}")]
    ProviderResult { code: String, message: String },

    #[error("Upstream payload missing expected field: {0}")]
    PayloadShape(String),

    // Storage errors
    #[error("Store error: {0}")]
    Store(String),

    #[error("Cache error: {0}")]
    Cache(String),

    // Infrastructure errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures of the upstream provider itself, the class that
    /// is eligible for a fallback-bucket retry.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamStatus { .. }
                | Error::UpstreamTransport(_)
                | Error::ProviderResult { .. }
                | Error::PayloadShape(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
