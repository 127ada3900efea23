//! # lemon-http
//!
//! REST client. Routes are a method plus a path template; requests carry the
//! configured `Authorization` header. Rate limits are reported, not queued:
//! a 429 comes back as [`HttpError::RateLimited`] with the server's retry delay.

pub mod api;
pub mod client;
pub mod error;
pub mod route;

pub use api::{CreateMessage, GatewayBot, SessionStartLimit};
pub use client::{audit_reason, parse_retry_after, HttpClient, AUDIT_LOG_REASON};
pub use error::{HttpError, HttpResult};
pub use route::{CompiledRoute, Route};
