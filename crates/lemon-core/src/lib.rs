//! # lemon-core
//!
//! Data model shared by the gateway client, the entity cache, and the REST client.
//! Snowflake identifiers, intent and permission bitfields, and the entity payloads
//! decoded from gateway dispatches. No I/O happens here.

pub mod entities;
pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, Channel, ChannelType, Embed, Emoji, Guild, GuildSnapshot, Member, Message,
    OverwriteKind, PartialEmoji, PermissionOverwrite, Reaction, ReactionEvent, Role, Sticker,
    StickerFormat, UnavailableGuild, User, VoiceServer, VoiceState,
};
pub use error::{FromPayload, ParseError};
pub use value_objects::{Intents, Permissions, Snowflake, SnowflakeParseError};
