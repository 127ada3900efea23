//! # lemon-gateway
//!
//! Client for the gateway event stream: a persistent WebSocket carrying sequenced,
//! zlib-stream compressed frames.
//!
//! - [`protocol`]: opcodes, close codes, frames and payloads
//! - [`transport`]: zlib-stream reassembly
//! - [`session`]: session state machine, sequence tracking, heartbeat
//! - [`dispatcher`]: raw dispatches to typed [`GatewayEvent`]s
//! - [`events`]: the ordered event bus
//! - [`cache_sync`]: keeps the entity cache current
//! - [`client`]: connection lifecycle, reconnect and resume

pub mod cache_sync;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod protocol;
pub mod session;
pub mod transport;

pub use cache_sync::CacheUpdater;
pub use client::{Client, ClientBuilder, GatewayHandle};
pub use dispatcher::Dispatcher;
pub use error::{GatewayError, GatewayResult};
pub use events::{EventBus, EventHandler, GatewayEvent, ANY_EVENT};
pub use session::SessionStatus;
