//! HTTP client
//!
//! Thin wrapper over `reqwest`: joins compiled routes onto the API base url,
//! attaches the `Authorization` header, and turns responses into JSON values.
//! A 429 is reported to the caller as [`HttpError::RateLimited`] and never
//! retried here.

use std::time::Duration;

use lemon_common::ClientConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{HttpError, HttpResult};
use crate::route::CompiledRoute;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("lemon (", env!("CARGO_PKG_VERSION"), ")");

/// Header carrying the reason shown in the audit log
pub const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    base_url: String,
}

impl HttpClient {
    /// Client for the configured API base url, authorized with the configured token
    pub fn new(config: &ClientConfig) -> HttpResult<Self> {
        Self::with_base_url(&config.http.api_url, &config.auth.authorization())
    }

    pub fn with_base_url(base_url: &str, authorization: &str) -> HttpResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(authorization)
            .map_err(|_| HttpError::InvalidHeader { name: "Authorization" })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request. Empty and 204 responses come back as `Value::Null`.
    pub async fn request(
        &self,
        route: CompiledRoute,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> HttpResult<Value> {
        let url = format!("{}{}", self.base_url, route.path);
        tracing::debug!(method = %route.method, path = %route.path, "HTTP request");

        let mut request = self.http.request(route.method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let header = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body: Option<Value> = response.json().await.ok();
            let retry_after = header
                .or_else(|| {
                    body.as_ref()
                        .and_then(|b| b.get("retry_after"))
                        .and_then(Value::as_f64)
                        .and_then(seconds)
                })
                .unwrap_or_default();
            let global = body
                .as_ref()
                .and_then(|b| b.get("global"))
                .and_then(Value::as_bool)
                .unwrap_or(false);

            tracing::warn!(
                path = %route.path,
                retry_after_ms = retry_after.as_millis() as u64,
                global,
                "Rate limited"
            );
            return Err(HttpError::RateLimited { retry_after, global });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), path = %route.path, "HTTP request failed");
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Headers for an audit-logged request; `None` yields no headers
pub fn audit_reason(reason: Option<&str>) -> HttpResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(reason) = reason {
        let value = HeaderValue::from_str(reason)
            .map_err(|_| HttpError::InvalidHeader { name: AUDIT_LOG_REASON })?;
        headers.insert(AUDIT_LOG_REASON, value);
    }
    Ok(headers)
}

/// Non-negative finite seconds; values past `Duration::MAX` saturate
fn seconds(value: f64) -> Option<Duration> {
    (value.is_finite() && value >= 0.0)
        .then(|| Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX))
}

/// Parse a `Retry-After` value: decimal seconds or an HTTP date
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<f64>() {
        return seconds(secs);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let delay = date.signed_duration_since(chrono::Utc::now());
        return Some(delay.to_std().unwrap_or_default());
    }

    None
}
