//! REST error types

use std::time::Duration;

use lemon_core::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be sent or the response could not be read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 429. Nothing is retried; the caller decides whether to wait `retry_after`.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration, global: bool },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not JSON
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A route template placeholder had no value
    #[error("Missing route parameter `{0}`")]
    MissingParam(String),

    #[error("Invalid header value for {name}")]
    InvalidHeader { name: &'static str },
}

impl HttpError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;
