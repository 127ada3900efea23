//! Guild-scoped deltas: members, roles, emojis, stickers

use lemon_core::{Emoji, Member, Role, Snowflake, Sticker};
use std::collections::BTreeSet;

use crate::entity_cache::EntityCache;

impl EntityCache {
    // =========================================================================
    // Members
    // =========================================================================

    /// Insert or replace a member (and its user). Returns false when the guild is not cached.
    pub fn upsert_member(&self, member: Member) -> bool {
        let guild_id = member.guild_id;
        let user_id = member.user_id();
        {
            let Some(mut guild) = self.guilds.get_mut(&guild_id) else {
                return false;
            };
            guild.member_ids.insert(user_id);
        }
        self.users.insert(user_id, member.user.clone());
        self.members.insert((guild_id, user_id), member);
        true
    }

    /// Insert a batch of members from a member chunk
    pub fn upsert_members(&self, members: Vec<Member>) -> usize {
        members
            .into_iter()
            .map(|member| usize::from(self.upsert_member(member)))
            .sum()
    }

    /// Remove a member; the user is dropped too once no cached guild lists them
    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        if let Some(mut guild) = self.guilds.get_mut(&guild_id) {
            guild.member_ids.remove(&user_id);
        }
        let removed = self.members.remove(&(guild_id, user_id)).map(|(_, m)| m);
        self.voice_states.remove(&(guild_id, user_id));
        if !self.user_referenced(user_id, None) {
            self.users.remove(&user_id);
        }
        removed
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Insert or replace a role; an uncached guild is ignored
    pub fn upsert_role(&self, guild_id: Snowflake, role: Role) -> bool {
        {
            let Some(mut guild) = self.guilds.get_mut(&guild_id) else {
                return false;
            };
            guild.role_ids.insert(role.id);
        }
        self.roles.insert(role.id, role);
        true
    }

    /// Remove a role and strip it from the guild's cached members
    pub fn remove_role(&self, guild_id: Snowflake, role_id: Snowflake) -> Option<Role> {
        if let Some(mut guild) = self.guilds.get_mut(&guild_id) {
            guild.role_ids.remove(&role_id);
        }
        self.members
            .iter_mut()
            .filter(|entry| entry.key().0 == guild_id)
            .for_each(|mut entry| entry.value_mut().roles.retain(|&r| r != role_id));
        self.roles.remove(&role_id).map(|(_, r)| r)
    }

    // =========================================================================
    // Emojis and stickers
    // =========================================================================

    /// Replace the guild's emoji list: ids missing from `emojis` are removed, the rest upserted
    pub fn replace_emojis(&self, guild_id: Snowflake, emojis: Vec<Emoji>) -> bool {
        let incoming: BTreeSet<Snowflake> = emojis.iter().map(|e| e.id).collect();
        let stale = {
            let Some(mut guild) = self.guilds.get_mut(&guild_id) else {
                return false;
            };
            let stale: Vec<_> = guild.emoji_ids.difference(&incoming).copied().collect();
            guild.emoji_ids.clone_from(&incoming);
            stale
        };
        for id in &stale {
            self.emojis.remove(id);
        }
        for emoji in emojis {
            self.emojis.insert(emoji.id, emoji);
        }
        tracing::trace!(guild_id = %guild_id, removed = stale.len(), total = incoming.len(), "Emojis replaced");
        true
    }

    /// Replace the guild's sticker list, diffing by id like [`EntityCache::replace_emojis`]
    pub fn replace_stickers(&self, guild_id: Snowflake, stickers: Vec<Sticker>) -> bool {
        let incoming: BTreeSet<Snowflake> = stickers.iter().map(|s| s.id).collect();
        let stale = {
            let Some(mut guild) = self.guilds.get_mut(&guild_id) else {
                return false;
            };
            let stale: Vec<_> = guild.sticker_ids.difference(&incoming).copied().collect();
            guild.sticker_ids.clone_from(&incoming);
            stale
        };
        for id in &stale {
            self.stickers.remove(id);
        }
        for mut sticker in stickers {
            sticker.guild_id = Some(guild_id);
            self.stickers.insert(sticker.id, sticker);
        }
        true
    }
}
