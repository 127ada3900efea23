//! # lemon-common
//!
//! Shared utilities including client configuration, the top-level error type, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AuthConfig, CacheConfig, ClientConfig, ConfigError, Environment, GatewayConfig, HttpConfig,
    ReconnectConfig,
};
pub use error::{ClientError, ClientResult};
pub use telemetry::{
    try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError,
};
