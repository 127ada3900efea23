//! Client error type
//!
//! What a process embedding the client can fail with before or while running the gateway.

use crate::config::ConfigError;
use crate::telemetry::TracingError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TracingError),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl ClientError {
    pub fn gateway(err: impl std::fmt::Display) -> Self {
        Self::Gateway(err.to_string())
    }

    pub fn http(err: impl std::fmt::Display) -> Self {
        Self::Http(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
