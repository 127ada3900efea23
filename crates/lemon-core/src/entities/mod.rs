//! Entity records decoded from gateway payloads

mod channel;
mod emoji;
mod guild;
mod member;
mod message;
mod reaction;
mod role;
mod sticker;
mod user;
mod voice;

pub use channel::{Channel, ChannelType, OverwriteKind, PermissionOverwrite, ThreadMetadata};
pub use emoji::Emoji;
pub use guild::{Guild, GuildSnapshot, UnavailableGuild};
pub use member::Member;
pub use message::{Attachment, Embed, EmbedField, EmbedFooter, Message};
pub use reaction::{PartialEmoji, Reaction, ReactionEvent};
pub use role::Role;
pub use sticker::{Sticker, StickerFormat};
pub use user::User;
pub use voice::{VoiceServer, VoiceState};
