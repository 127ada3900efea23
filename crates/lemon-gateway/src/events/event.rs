//! Typed gateway events
//!
//! Each dispatch becomes one variant. "Before" values come from the cache at
//! dispatch time and are `None` when the entity was never cached.

use std::time::Duration;

use lemon_cache::CachedGuild;
use lemon_core::{
    Channel, Emoji, Guild, GuildSnapshot, Member, Message, PartialEmoji, ReactionEvent, Role,
    Snowflake, Sticker, User, VoiceServer, VoiceState,
};
use serde_json::Value;

use crate::protocol::ReadyPayload;

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    // === Lifecycle ===
    /// READY or RESUMED completed the handshake
    Connected,
    Disconnected {
        code: Option<u16>,
        resumable: bool,
    },
    Reconnecting {
        attempt: u32,
        delay: Duration,
    },

    // === Session ===
    Ready(Box<ReadyPayload>),
    Resumed,

    // === Guilds ===
    GuildCreate(Box<GuildSnapshot>),
    GuildUpdate {
        before: Option<CachedGuild>,
        after: Guild,
    },
    GuildDelete {
        guild: CachedGuild,
        unavailable: bool,
    },

    // === Channels and threads ===
    ChannelCreate(Channel),
    ChannelUpdate {
        before: Option<Channel>,
        after: Channel,
    },
    ChannelDelete(Channel),
    ThreadCreate(Channel),
    ThreadUpdate {
        before: Option<Channel>,
        after: Channel,
    },
    ThreadDelete(Channel),

    // === Members ===
    MemberAdd {
        guild: CachedGuild,
        member: Member,
    },
    MemberUpdate {
        guild: CachedGuild,
        before: Option<Member>,
        after: Member,
    },
    MemberRemove {
        guild: CachedGuild,
        member: Option<Member>,
        user: User,
    },
    MembersChunk {
        guild: CachedGuild,
        members: Vec<Member>,
    },

    // === Roles ===
    RoleCreate {
        guild: CachedGuild,
        role: Role,
    },
    RoleUpdate {
        guild: CachedGuild,
        before: Option<Role>,
        after: Role,
    },
    RoleDelete {
        guild: CachedGuild,
        role: Option<Role>,
        role_id: Snowflake,
    },

    // === Moderation ===
    BanAdd {
        guild: CachedGuild,
        user: User,
    },
    BanRemove {
        guild: CachedGuild,
        user: User,
    },

    // === Emojis and stickers (full replacement lists) ===
    EmojisUpdate {
        guild: CachedGuild,
        emojis: Vec<Emoji>,
    },
    StickersUpdate {
        guild: CachedGuild,
        stickers: Vec<Sticker>,
    },

    // === Messages ===
    MessageCreate(Message),
    MessageUpdate {
        before: Option<Message>,
        after: Message,
    },
    /// `message` is the cached copy captured before removal
    MessageDelete {
        id: Snowflake,
        channel_id: Snowflake,
        guild_id: Option<Snowflake>,
        message: Option<Message>,
    },
    MessageDeleteBulk {
        ids: Vec<Snowflake>,
        channel_id: Snowflake,
        guild_id: Option<Snowflake>,
        messages: Vec<Message>,
    },

    // === Reactions ===
    ReactionAdd {
        message: Option<Message>,
        reaction: ReactionEvent,
    },
    ReactionRemove {
        message: Option<Message>,
        reaction: ReactionEvent,
    },
    ReactionRemoveAll {
        channel_id: Snowflake,
        message_id: Snowflake,
        guild_id: Option<Snowflake>,
    },
    ReactionRemoveEmoji {
        channel_id: Snowflake,
        message_id: Snowflake,
        guild_id: Option<Snowflake>,
        emoji: PartialEmoji,
    },

    // === Voice ===
    VoiceStateUpdate {
        guild: Option<CachedGuild>,
        state: VoiceState,
    },
    VoiceServerUpdate {
        guild: CachedGuild,
        server: VoiceServer,
    },

    // === Current user ===
    UserUpdate {
        before: Option<User>,
        after: User,
    },

    /// Any dispatch without a typed variant, passed through verbatim
    Raw { name: String, data: Value },
}

impl GatewayEvent {
    /// Lower-cased event name subscribers register under
    pub fn name(&self) -> &str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Ready(_) => "ready",
            Self::Resumed => "resumed",
            Self::GuildCreate(_) => "guild_create",
            Self::GuildUpdate { .. } => "guild_update",
            Self::GuildDelete { .. } => "guild_delete",
            Self::ChannelCreate(_) => "channel_create",
            Self::ChannelUpdate { .. } => "channel_update",
            Self::ChannelDelete(_) => "channel_delete",
            Self::ThreadCreate(_) => "thread_create",
            Self::ThreadUpdate { .. } => "thread_update",
            Self::ThreadDelete(_) => "thread_delete",
            Self::MemberAdd { .. } => "guild_member_add",
            Self::MemberUpdate { .. } => "guild_member_update",
            Self::MemberRemove { .. } => "guild_member_remove",
            Self::MembersChunk { .. } => "guild_members_chunk",
            Self::RoleCreate { .. } => "guild_role_create",
            Self::RoleUpdate { .. } => "guild_role_update",
            Self::RoleDelete { .. } => "guild_role_delete",
            Self::BanAdd { .. } => "guild_ban_add",
            Self::BanRemove { .. } => "guild_ban_remove",
            Self::EmojisUpdate { .. } => "guild_emojis_update",
            Self::StickersUpdate { .. } => "guild_stickers_update",
            Self::MessageCreate(_) => "message_create",
            Self::MessageUpdate { .. } => "message_update",
            Self::MessageDelete { .. } => "message_delete",
            Self::MessageDeleteBulk { .. } => "message_delete_bulk",
            Self::ReactionAdd { .. } => "message_reaction_add",
            Self::ReactionRemove { .. } => "message_reaction_remove",
            Self::ReactionRemoveAll { .. } => "message_reaction_remove_all",
            Self::ReactionRemoveEmoji { .. } => "message_reaction_remove_emoji",
            Self::VoiceStateUpdate { .. } => "voice_state_update",
            Self::VoiceServerUpdate { .. } => "voice_server_update",
            Self::UserUpdate { .. } => "user_update",
            Self::Raw { name, .. } => name,
        }
    }

    /// Connection lifecycle events, published by the client rather than the dispatcher
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::Connected | Self::Disconnected { .. } | Self::Reconnecting { .. }
        )
    }

    /// Guild the event belongs to, when it has one
    pub fn guild_id(&self) -> Option<Snowflake> {
        match self {
            Self::GuildCreate(snapshot) => Some(snapshot.id()),
            Self::GuildUpdate { after, .. } => Some(after.id),
            Self::GuildDelete { guild, .. }
            | Self::MemberAdd { guild, .. }
            | Self::MemberUpdate { guild, .. }
            | Self::MemberRemove { guild, .. }
            | Self::MembersChunk { guild, .. }
            | Self::RoleCreate { guild, .. }
            | Self::RoleUpdate { guild, .. }
            | Self::RoleDelete { guild, .. }
            | Self::BanAdd { guild, .. }
            | Self::BanRemove { guild, .. }
            | Self::EmojisUpdate { guild, .. }
            | Self::StickersUpdate { guild, .. }
            | Self::VoiceServerUpdate { guild, .. } => Some(guild.id()),
            Self::ChannelCreate(channel)
            | Self::ChannelDelete(channel)
            | Self::ThreadCreate(channel)
            | Self::ThreadDelete(channel)
            | Self::ChannelUpdate { after: channel, .. }
            | Self::ThreadUpdate { after: channel, .. } => channel.guild_id,
            Self::MessageCreate(message) | Self::MessageUpdate { after: message, .. } => {
                message.guild_id
            }
            Self::MessageDelete { guild_id, .. }
            | Self::MessageDeleteBulk { guild_id, .. }
            | Self::ReactionRemoveAll { guild_id, .. }
            | Self::ReactionRemoveEmoji { guild_id, .. } => *guild_id,
            Self::ReactionAdd { reaction, .. } | Self::ReactionRemove { reaction, .. } => {
                reaction.guild_id
            }
            Self::VoiceStateUpdate { state, .. } => state.guild_id,
            _ => None,
        }
    }
}
