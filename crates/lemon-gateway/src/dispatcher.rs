//! Dispatcher - turns `(event name, payload)` into a typed [`GatewayEvent`]
//!
//! The dispatcher only reads the cache: "before" values and parent guilds are
//! looked up here, before the event is published, so subscribers see state as it
//! was prior to the cache updater applying the event. A missing parent or an
//! unparseable payload drops the event with a warning.

use std::sync::Arc;

use lemon_cache::{CachedGuild, SharedCache};
use lemon_core::{
    Channel, Emoji, FromPayload, Guild, GuildSnapshot, Member, Message, ParseError, PartialEmoji,
    ReactionEvent, Role, Snowflake, Sticker, UnavailableGuild, User, VoiceServer, VoiceState,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};
use crate::events::{EventBus, GatewayEvent};
use crate::protocol::ReadyPayload;

/// Decode a required field of a partial payload
fn field<T: DeserializeOwned>(data: &Value, entity: &'static str, name: &'static str) -> Result<T, ParseError> {
    let value = data
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or(ParseError::MissingField { entity, field: name })?;
    T::deserialize(value).map_err(|source| ParseError::Invalid { entity, source })
}

fn optional_field<T: DeserializeOwned>(
    data: &Value,
    entity: &'static str,
    name: &'static str,
) -> Result<Option<T>, ParseError> {
    match data.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|source| ParseError::Invalid { entity, source }),
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    cache: SharedCache,
    bus: Arc<EventBus>,
}

impl Dispatcher {
    pub fn new(cache: SharedCache, bus: Arc<EventBus>) -> Self {
        Self { cache, bus }
    }

    /// Translate and publish. Failures are logged and the event is dropped.
    pub async fn dispatch(&self, name: &str, data: Value) -> bool {
        match self.translate(name, &data) {
            Ok(event) => {
                self.bus.publish(event).await;
                true
            }
            Err(err @ GatewayError::CacheMiss { .. }) => {
                tracing::warn!(event = %name, error = %err, "Dropping event for uncached parent");
                false
            }
            Err(err) => {
                tracing::warn!(event = %name, error = %err, "Dropping malformed event");
                false
            }
        }
    }

    fn guild_for(&self, event: &'static str, data: &Value) -> GatewayResult<CachedGuild> {
        let id: Snowflake = field(data, "guild", "guild_id")?;
        self.cached_guild(event, id)
    }

    fn cached_guild(&self, event: &'static str, id: Snowflake) -> GatewayResult<CachedGuild> {
        self.cache.get_guild(id).ok_or(GatewayError::CacheMiss {
            event,
            entity: "guild",
            id,
        })
    }

    /// Build the typed event for a dispatch. Event names are matched case-insensitively.
    pub fn translate(&self, name: &str, data: &Value) -> GatewayResult<GatewayEvent> {
        let name = name.to_ascii_lowercase();
        let event = match name.as_str() {
            "ready" => GatewayEvent::Ready(Box::new(ReadyPayload::from_value(data)?)),
            "resumed" => GatewayEvent::Resumed,

            // === Guilds ===
            "guild_create" => GatewayEvent::GuildCreate(Box::new(GuildSnapshot::from_value(data)?)),
            "guild_update" => {
                let after = Guild::from_value(data)?;
                GatewayEvent::GuildUpdate {
                    before: self.cache.get_guild(after.id),
                    after,
                }
            }
            "guild_delete" => {
                let stub = UnavailableGuild::from_value(data)?;
                GatewayEvent::GuildDelete {
                    guild: self.cached_guild("guild_delete", stub.id)?,
                    unavailable: stub.unavailable,
                }
            }

            // === Channels and threads ===
            "channel_create" => GatewayEvent::ChannelCreate(Channel::from_value(data)?),
            "thread_create" => GatewayEvent::ThreadCreate(Channel::from_value(data)?),
            "channel_update" | "thread_update" => {
                let after = Channel::from_value(data)?;
                let before = self.cache.get_any_channel(after.id);
                if name == "channel_update" {
                    GatewayEvent::ChannelUpdate { before, after }
                } else {
                    GatewayEvent::ThreadUpdate { before, after }
                }
            }
            "channel_delete" | "thread_delete" => {
                let id: Snowflake = field(data, "channel", "id")?;
                let channel = match self.cache.get_any_channel(id) {
                    Some(cached) => cached,
                    None => Channel::from_value(data)?,
                };
                if name == "channel_delete" {
                    GatewayEvent::ChannelDelete(channel)
                } else {
                    GatewayEvent::ThreadDelete(channel)
                }
            }

            // === Members ===
            "guild_member_add" => {
                let guild = self.guild_for("guild_member_add", data)?;
                let member = Member::from_value(data)?.with_guild(guild.id());
                GatewayEvent::MemberAdd { guild, member }
            }
            "guild_member_update" => {
                let guild = self.guild_for("guild_member_update", data)?;
                let after = Member::from_value(data)?.with_guild(guild.id());
                let before = self.cache.get_member(guild.id(), after.user_id());
                GatewayEvent::MemberUpdate { guild, before, after }
            }
            "guild_member_remove" => {
                let guild = self.guild_for("guild_member_remove", data)?;
                let user: User = field(data, "member", "user")?;
                let member = self.cache.get_member(guild.id(), user.id);
                GatewayEvent::MemberRemove { guild, member, user }
            }
            "guild_members_chunk" => {
                let guild = self.guild_for("guild_members_chunk", data)?;
                let members = Member::list_from_field(data, "members")?
                    .into_iter()
                    .map(|m| m.with_guild(guild.id()))
                    .collect();
                GatewayEvent::MembersChunk { guild, members }
            }

            // === Roles ===
            "guild_role_create" => {
                let guild = self.guild_for("guild_role_create", data)?;
                let role: Role = field(data, "role", "role")?;
                GatewayEvent::RoleCreate { guild, role }
            }
            "guild_role_update" => {
                let guild = self.guild_for("guild_role_update", data)?;
                let after: Role = field(data, "role", "role")?;
                let before = self.cache.get_role(after.id);
                GatewayEvent::RoleUpdate { guild, before, after }
            }
            "guild_role_delete" => {
                let guild = self.guild_for("guild_role_delete", data)?;
                let role_id: Snowflake = field(data, "role", "role_id")?;
                GatewayEvent::RoleDelete {
                    guild,
                    role: self.cache.get_role(role_id),
                    role_id,
                }
            }

            // === Bans ===
            "guild_ban_add" => GatewayEvent::BanAdd {
                guild: self.guild_for("guild_ban_add", data)?,
                user: field(data, "ban", "user")?,
            },
            "guild_ban_remove" => GatewayEvent::BanRemove {
                guild: self.guild_for("guild_ban_remove", data)?,
                user: field(data, "ban", "user")?,
            },

            // === Emojis and stickers ===
            "guild_emojis_update" => GatewayEvent::EmojisUpdate {
                guild: self.guild_for("guild_emojis_update", data)?,
                emojis: Emoji::list_from_field(data, "emojis")?,
            },
            "guild_stickers_update" => GatewayEvent::StickersUpdate {
                guild: self.guild_for("guild_stickers_update", data)?,
                stickers: Sticker::list_from_field(data, "stickers")?,
            },

            // === Messages ===
            "message_create" => GatewayEvent::MessageCreate(Message::from_value(data)?),
            "message_update" => {
                let id: Snowflake = field(data, "message", "id")?;
                let before = self.cache.get_message(id);
                // updates may be partial; overlay them on the cached copy when there is one
                match before {
                    Some(cached) => GatewayEvent::MessageUpdate {
                        after: cached.merge_update(data)?,
                        before: Some(cached),
                    },
                    None => match Message::from_value(data) {
                        Ok(after) => GatewayEvent::MessageUpdate { before: None, after },
                        Err(err) => {
                            tracing::debug!(message_id = %id, error = %err, "Partial update for uncached message");
                            GatewayEvent::Raw {
                                name,
                                data: data.clone(),
                            }
                        }
                    },
                }
            }
            "message_delete" => {
                let id: Snowflake = field(data, "message", "id")?;
                GatewayEvent::MessageDelete {
                    id,
                    channel_id: field(data, "message", "channel_id")?,
                    guild_id: optional_field(data, "message", "guild_id")?,
                    message: self.cache.get_message(id),
                }
            }
            "message_delete_bulk" => {
                let ids: Vec<Snowflake> = field(data, "message", "ids")?;
                let messages = ids.iter().filter_map(|&id| self.cache.get_message(id)).collect();
                GatewayEvent::MessageDeleteBulk {
                    ids,
                    channel_id: field(data, "message", "channel_id")?,
                    guild_id: optional_field(data, "message", "guild_id")?,
                    messages,
                }
            }

            // === Reactions ===
            "message_reaction_add" | "message_reaction_remove" => {
                let reaction = ReactionEvent::from_value(data)?;
                let message = self.cache.get_message(reaction.message_id);
                if name == "message_reaction_add" {
                    GatewayEvent::ReactionAdd { message, reaction }
                } else {
                    GatewayEvent::ReactionRemove { message, reaction }
                }
            }
            "message_reaction_remove_all" => GatewayEvent::ReactionRemoveAll {
                channel_id: field(data, "reaction", "channel_id")?,
                message_id: field(data, "reaction", "message_id")?,
                guild_id: optional_field(data, "reaction", "guild_id")?,
            },
            "message_reaction_remove_emoji" => GatewayEvent::ReactionRemoveEmoji {
                channel_id: field(data, "reaction", "channel_id")?,
                message_id: field(data, "reaction", "message_id")?,
                guild_id: optional_field(data, "reaction", "guild_id")?,
                emoji: field::<PartialEmoji>(data, "reaction", "emoji")?,
            },

            // === Voice ===
            "voice_state_update" => {
                let state = VoiceState::from_value(data)?;
                let guild = state.guild_id.and_then(|id| self.cache.get_guild(id));
                GatewayEvent::VoiceStateUpdate { guild, state }
            }
            "voice_server_update" => {
                let server = VoiceServer::from_value(data)?;
                GatewayEvent::VoiceServerUpdate {
                    guild: self.cached_guild("voice_server_update", server.guild_id)?,
                    server,
                }
            }

            // === Current user ===
            "user_update" => GatewayEvent::UserUpdate {
                before: self.cache.current_user(),
                after: User::from_value(data)?,
            },

            _ => GatewayEvent::Raw {
                name,
                data: data.clone(),
            },
        };
        Ok(event)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("bus", &self.bus).finish()
    }
}
