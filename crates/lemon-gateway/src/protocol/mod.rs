//! Gateway wire protocol: opcodes, close codes, frames and payloads

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{
    Activity, HelloPayload, IdentifyPayload, IdentifyProperties, PresenceUpdatePayload,
    ReadyPayload, RequestGuildMembersPayload, ResumePayload, Status, VoiceStateUpdatePayload,
};

/// Gateway API version requested in the connect URL
pub const API_VERSION: u8 = 9;
