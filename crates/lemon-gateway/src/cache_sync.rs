//! Cache updater - the first subscriber on every bus
//!
//! Applies each published event to the entity cache. Because the bus awaits
//! handlers in order, every later handler observes the post-event cache.

use std::sync::Arc;

use async_trait::async_trait;
use lemon_cache::SharedCache;

use crate::events::{EventHandler, GatewayEvent};

pub struct CacheUpdater {
    cache: SharedCache,
}

impl CacheUpdater {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    /// Apply one event to the cache
    pub fn apply(&self, event: &GatewayEvent) {
        let cache = &self.cache;
        match event {
            GatewayEvent::Ready(ready) => cache.set_ready(ready.user.clone(), &ready.guilds),

            GatewayEvent::GuildCreate(snapshot) => cache.insert_guild((**snapshot).clone()),
            GatewayEvent::GuildUpdate { after, .. } => cache.update_guild(after.clone()),
            GatewayEvent::GuildDelete { guild, unavailable } => {
                cache.remove_guild(guild.id(), *unavailable);
            }

            GatewayEvent::ChannelCreate(channel)
            | GatewayEvent::ThreadCreate(channel)
            | GatewayEvent::ChannelUpdate { after: channel, .. }
            | GatewayEvent::ThreadUpdate { after: channel, .. } => {
                cache.upsert_channel(channel.clone());
            }
            GatewayEvent::ChannelDelete(channel) | GatewayEvent::ThreadDelete(channel) => {
                cache.remove_channel(channel.id);
            }

            GatewayEvent::MemberAdd { member, .. }
            | GatewayEvent::MemberUpdate { after: member, .. } => {
                cache.upsert_member(member.clone());
            }
            GatewayEvent::MemberRemove { guild, user, .. } => {
                cache.remove_member(guild.id(), user.id);
            }
            GatewayEvent::MembersChunk { members, .. } => {
                let added = cache.upsert_members(members.clone());
                tracing::debug!(added, "Member chunk cached");
            }

            GatewayEvent::RoleCreate { guild, role }
            | GatewayEvent::RoleUpdate {
                guild, after: role, ..
            } => {
                cache.upsert_role(guild.id(), role.clone());
            }
            GatewayEvent::RoleDelete { guild, role_id, .. } => {
                cache.remove_role(guild.id(), *role_id);
            }

            GatewayEvent::EmojisUpdate { guild, emojis } => {
                cache.replace_emojis(guild.id(), emojis.clone());
            }
            GatewayEvent::StickersUpdate { guild, stickers } => {
                cache.replace_stickers(guild.id(), stickers.clone());
            }

            GatewayEvent::MessageCreate(message) => cache.insert_message(message.clone()),
            GatewayEvent::MessageUpdate { after, .. } => cache.update_message(after.clone()),
            GatewayEvent::MessageDelete { id, .. } => {
                cache.remove_message(*id);
            }
            GatewayEvent::MessageDeleteBulk { ids, .. } => {
                cache.remove_messages(ids);
            }

            GatewayEvent::ReactionAdd { reaction, .. } => {
                cache.add_reaction(reaction.message_id, reaction.user_id, &reaction.emoji);
            }
            GatewayEvent::ReactionRemove { reaction, .. } => {
                cache.remove_reaction(reaction.message_id, reaction.user_id, &reaction.emoji);
            }
            GatewayEvent::ReactionRemoveAll { message_id, .. } => {
                cache.clear_reactions(*message_id);
            }
            GatewayEvent::ReactionRemoveEmoji {
                message_id, emoji, ..
            } => {
                cache.clear_reaction_emoji(*message_id, emoji);
            }

            GatewayEvent::VoiceStateUpdate { state, .. } => {
                cache.update_voice_state(state.clone());
            }
            GatewayEvent::VoiceServerUpdate { server, .. } => {
                cache.set_voice_server(server.clone());
            }

            GatewayEvent::UserUpdate { after, .. } => {
                cache.set_current_user(after.clone());
            }

            GatewayEvent::Connected
            | GatewayEvent::Disconnected { .. }
            | GatewayEvent::Reconnecting { .. }
            | GatewayEvent::Resumed
            | GatewayEvent::BanAdd { .. }
            | GatewayEvent::BanRemove { .. }
            | GatewayEvent::Raw { .. } => {}
        }
    }
}

#[async_trait]
impl EventHandler for CacheUpdater {
    async fn handle(&self, event: Arc<GatewayEvent>) {
        self.apply(&event);
    }
}
