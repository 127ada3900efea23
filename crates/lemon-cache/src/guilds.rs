//! Guild lifecycle: snapshot insertion, metadata replacement, and cascading removal

use lemon_core::{Guild, GuildSnapshot, Snowflake};

use crate::cached_guild::CachedGuild;
use crate::entity_cache::EntityCache;

impl EntityCache {
    /// Insert a full guild snapshot, replacing any previous copy of the guild and its children
    pub fn insert_guild(&self, snapshot: GuildSnapshot) {
        let guild_id = snapshot.id();
        if let Some((_, previous)) = self.guilds.remove(&guild_id) {
            self.purge_children(&previous);
        }

        let mut cached = CachedGuild::new(snapshot.guild);
        for channel in snapshot.channels {
            cached.channel_ids.insert(channel.id);
            self.channels.insert(channel.id, channel);
        }
        for thread in snapshot.threads {
            cached.thread_ids.insert(thread.id);
            self.threads.insert(thread.id, thread);
        }
        for role in snapshot.roles {
            cached.role_ids.insert(role.id);
            self.roles.insert(role.id, role);
        }
        for member in snapshot.members {
            let user_id = member.user_id();
            cached.member_ids.insert(user_id);
            self.users.insert(user_id, member.user.clone());
            self.members.insert((guild_id, user_id), member);
        }
        for emoji in snapshot.emojis {
            cached.emoji_ids.insert(emoji.id);
            self.emojis.insert(emoji.id, emoji);
        }
        for sticker in snapshot.stickers {
            cached.sticker_ids.insert(sticker.id);
            self.stickers.insert(sticker.id, sticker);
        }
        for state in snapshot.voice_states {
            if state.is_connected() {
                self.voice_states.insert((guild_id, state.user_id), state);
            }
        }

        tracing::debug!(
            guild_id = %guild_id,
            channels = cached.channel_ids.len(),
            roles = cached.role_ids.len(),
            members = cached.member_ids.len(),
            "Guild cached"
        );

        self.guilds.insert(guild_id, cached);
        self.unavailable_guilds.write().remove(&guild_id);
    }

    /// Replace guild metadata. An uncached guild is inserted without children.
    pub fn update_guild(&self, guild: Guild) {
        let guild_id = guild.id;
        if let Some(mut cached) = self.guilds.get_mut(&guild_id) {
            cached.guild = guild;
            return;
        }
        self.guilds.insert(guild_id, CachedGuild::new(guild));
    }

    /// Remove a guild and everything it owns. `unavailable` marks an outage rather
    /// than the current user leaving, so the guild is remembered as pending.
    pub fn remove_guild(&self, guild_id: Snowflake, unavailable: bool) -> Option<CachedGuild> {
        if unavailable {
            self.unavailable_guilds.write().insert(guild_id);
        }
        let (_, removed) = self.guilds.remove(&guild_id)?;
        self.purge_children(&removed);
        tracing::debug!(guild_id = %guild_id, unavailable, "Guild removed from cache");
        Some(removed)
    }

    /// Remove every entity referenced by `guild`, which must already be out of the guild map
    fn purge_children(&self, guild: &CachedGuild) {
        let guild_id = guild.id();
        for id in &guild.channel_ids {
            self.channels.remove(id);
            self.remove_channel_messages(*id);
        }
        for id in &guild.thread_ids {
            self.threads.remove(id);
            self.remove_channel_messages(*id);
        }
        for id in &guild.role_ids {
            self.roles.remove(id);
        }
        for id in &guild.emoji_ids {
            self.emojis.remove(id);
        }
        for id in &guild.sticker_ids {
            self.stickers.remove(id);
        }
        for user_id in &guild.member_ids {
            self.members.remove(&(guild_id, *user_id));
            if !self.user_referenced(*user_id, None) {
                self.users.remove(user_id);
            }
        }
        self.voice_states.retain(|(g, _), _| *g != guild_id);
    }
}
