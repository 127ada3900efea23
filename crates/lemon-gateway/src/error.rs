//! Gateway error types

use lemon_core::{ParseError, Snowflake};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::protocol::CloseCode;
use crate::transport::InflateError;

/// Everything that can end a connection or drop an event
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Socket-level failure, including failing to connect
    #[error("Transport error: {0}")]
    Transport(#[source] Box<tungstenite::Error>),

    /// A frame could not be decompressed or was not a gateway frame
    #[error("Decode error: {0}")]
    Decode(String),

    /// The gateway rejected the token (close 4004)
    #[error("Authentication failed")]
    Authentication,

    /// The session cannot be resumed; the next connection identifies from scratch
    #[error("Session invalidated")]
    SessionInvalidated,

    /// The gateway asked for a reconnect (op 7 or resumable op 9)
    #[error("Reconnect requested by the gateway")]
    ReconnectRequested,

    /// The previous heartbeat was never acknowledged
    #[error("Heartbeat not acknowledged, connection is a zombie")]
    ZombieConnection,

    /// The socket closed with a resumable code
    #[error("Connection closed ({code}): {reason}")]
    Closed { code: u16, reason: String },

    /// The socket closed with a code no reconnect can recover from
    #[error("Fatal close: {code}")]
    Fatal { code: CloseCode },

    #[error("Gave up after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },

    /// The client task is gone; commands can no longer be delivered
    #[error("Gateway client is not running")]
    NotRunning,

    /// A dispatch referenced an entity that is not cached
    #[error("{event}: {entity} {id} is not cached")]
    CacheMiss {
        event: &'static str,
        entity: &'static str,
        id: Snowflake,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl GatewayError {
    /// Classify a close frame received from the gateway
    pub fn from_close(code: u16, reason: impl Into<String>) -> Self {
        match CloseCode::from_u16(code) {
            Some(CloseCode::AuthenticationFailed) => Self::Authentication,
            Some(known) if known.is_fatal() => Self::Fatal { code: known },
            Some(known) if known.requires_fresh_identify() => Self::SessionInvalidated,
            _ => Self::Closed {
                code,
                reason: reason.into(),
            },
        }
    }

    /// No further reconnect is attempted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Authentication | Self::Fatal { .. } | Self::ReconnectExhausted { .. }
        )
    }

    /// The next connection may resume the current session
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Decode(_)
                | Self::ReconnectRequested
                | Self::ZombieConnection
                | Self::Closed { .. }
        )
    }

    /// Close code carried by the error, if it came from a close frame
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::Closed { code, .. } => Some(*code),
            Self::Fatal { code } => Some(code.as_u16()),
            Self::Authentication => Some(CloseCode::AuthenticationFailed.as_u16()),
            _ => None,
        }
    }
}

impl From<tungstenite::Error> for GatewayError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl From<InflateError> for GatewayError {
    fn from(err: InflateError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
