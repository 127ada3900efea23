//! Socket-level framing

mod inflater;

pub use inflater::{InflateError, Inflater, ZLIB_SUFFIX};

use crate::protocol::GatewayMessage;

/// Item queued for a connection's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Frame(GatewayMessage),
    /// Send a close frame with this code, then stop writing
    Close(u16),
}
