//! Entity cache
//!
//! Owns the canonical copy of every entity. Lookups hand out clones.

use dashmap::DashMap;
use lemon_core::{
    Channel, Emoji, Member, Message, Role, Snowflake, Sticker, UnavailableGuild, User, VoiceState,
};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use crate::cached_guild::CachedGuild;
use crate::messages::MessageStore;

pub type SharedCache = Arc<EntityCache>;

/// Identifier-keyed mirror of the gateway state
pub struct EntityCache {
    pub(crate) guilds: DashMap<Snowflake, CachedGuild>,
    pub(crate) channels: DashMap<Snowflake, Channel>,
    pub(crate) threads: DashMap<Snowflake, Channel>,
    pub(crate) users: DashMap<Snowflake, User>,
    /// Keyed by (guild id, user id)
    pub(crate) members: DashMap<(Snowflake, Snowflake), Member>,
    pub(crate) roles: DashMap<Snowflake, Role>,
    pub(crate) emojis: DashMap<Snowflake, Emoji>,
    pub(crate) stickers: DashMap<Snowflake, Sticker>,
    /// Keyed by (guild id, user id)
    pub(crate) voice_states: DashMap<(Snowflake, Snowflake), VoiceState>,
    pub(crate) messages: MessageStore,
    pub(crate) current_user: RwLock<Option<User>>,
    pub(crate) unavailable_guilds: RwLock<HashSet<Snowflake>>,
}

/// Entry counts per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub guilds: usize,
    pub channels: usize,
    pub threads: usize,
    pub users: usize,
    pub members: usize,
    pub roles: usize,
    pub emojis: usize,
    pub stickers: usize,
    pub voice_states: usize,
    pub messages: usize,
}

impl EntityCache {
    /// Create an empty cache retaining at most `max_messages` messages
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        Self {
            guilds: DashMap::new(),
            channels: DashMap::new(),
            threads: DashMap::new(),
            users: DashMap::new(),
            members: DashMap::new(),
            roles: DashMap::new(),
            emojis: DashMap::new(),
            stickers: DashMap::new(),
            voice_states: DashMap::new(),
            messages: MessageStore::new(max_messages),
            current_user: RwLock::new(None),
            unavailable_guilds: RwLock::new(HashSet::new()),
        }
    }

    /// Create a new cache wrapped in Arc
    #[must_use]
    pub fn new_shared(max_messages: usize) -> SharedCache {
        Arc::new(Self::new(max_messages))
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Start of a new session: drop everything and record who we are and which
    /// guilds are still to arrive.
    pub fn set_ready(&self, user: User, guilds: &[UnavailableGuild]) {
        self.clear();
        self.users.insert(user.id, user.clone());
        *self.current_user.write() = Some(user);
        self.unavailable_guilds
            .write()
            .extend(guilds.iter().map(|g| g.id));

        tracing::debug!(pending_guilds = guilds.len(), "Cache reset for new session");
    }

    /// Replace the current user, returning the previous value
    pub fn set_current_user(&self, user: User) -> Option<User> {
        self.users.insert(user.id, user.clone());
        self.current_user.write().replace(user)
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user.read().clone()
    }

    pub(crate) fn is_current_user(&self, user_id: Snowflake) -> bool {
        self.current_user
            .read()
            .as_ref()
            .is_some_and(|u| u.id == user_id)
    }

    /// Guilds announced by READY (or lost to an outage) that are not cached
    pub fn unavailable_guilds(&self) -> Vec<Snowflake> {
        let mut ids: Vec<_> = self.unavailable_guilds.read().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_unavailable(&self, guild_id: Snowflake) -> bool {
        self.unavailable_guilds.read().contains(&guild_id)
    }

    /// Drop every cached entity
    pub fn clear(&self) {
        self.guilds.clear();
        self.channels.clear();
        self.threads.clear();
        self.users.clear();
        self.members.clear();
        self.roles.clear();
        self.emojis.clear();
        self.stickers.clear();
        self.voice_states.clear();
        self.messages.clear();
        *self.current_user.write() = None;
        self.unavailable_guilds.write().clear();
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn get_guild(&self, id: Snowflake) -> Option<CachedGuild> {
        self.guilds.get(&id).map(|g| g.clone())
    }

    pub fn get_channel(&self, id: Snowflake) -> Option<Channel> {
        self.channels.get(&id).map(|c| c.clone())
    }

    pub fn get_thread(&self, id: Snowflake) -> Option<Channel> {
        self.threads.get(&id).map(|c| c.clone())
    }

    pub fn get_user(&self, id: Snowflake) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    pub fn get_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.get(id)
    }

    pub fn get_role(&self, id: Snowflake) -> Option<Role> {
        self.roles.get(&id).map(|r| r.clone())
    }

    pub fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        self.members.get(&(guild_id, user_id)).map(|m| m.clone())
    }

    pub fn get_emoji(&self, id: Snowflake) -> Option<Emoji> {
        self.emojis.get(&id).map(|e| e.clone())
    }

    pub fn get_sticker(&self, id: Snowflake) -> Option<Sticker> {
        self.stickers.get(&id).map(|s| s.clone())
    }

    pub fn get_voice_state(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<VoiceState> {
        self.voice_states
            .get(&(guild_id, user_id))
            .map(|v| v.clone())
    }

    /// Channel or thread, whichever holds the id
    pub fn get_any_channel(&self, id: Snowflake) -> Option<Channel> {
        self.get_channel(id).or_else(|| self.get_thread(id))
    }

    /// All cached guilds, ordered by id
    pub fn guilds(&self) -> Vec<CachedGuild> {
        let mut guilds: Vec<_> = self.guilds.iter().map(|g| g.clone()).collect();
        guilds.sort_unstable_by_key(CachedGuild::id);
        guilds
    }

    /// Channels of a guild ordered by position, then id
    pub fn guild_channels(&self, guild_id: Snowflake) -> Vec<Channel> {
        let mut channels = self.resolve(guild_id, |g| &g.channel_ids, &self.channels);
        channels.sort_by_key(|c| (c.position.unwrap_or(i32::MAX), c.id));
        channels
    }

    pub fn guild_threads(&self, guild_id: Snowflake) -> Vec<Channel> {
        self.resolve(guild_id, |g| &g.thread_ids, &self.threads)
    }

    /// Roles of a guild ordered by position, then id
    pub fn guild_roles(&self, guild_id: Snowflake) -> Vec<Role> {
        let mut roles = self.resolve(guild_id, |g| &g.role_ids, &self.roles);
        roles.sort_by_key(|r| (r.position, r.id));
        roles
    }

    pub fn guild_members(&self, guild_id: Snowflake) -> Vec<Member> {
        let Some(user_ids) = self.guilds.get(&guild_id).map(|g| g.member_ids.clone()) else {
            return Vec::new();
        };
        user_ids
            .into_iter()
            .filter_map(|user_id| self.get_member(guild_id, user_id))
            .collect()
    }

    pub fn guild_emojis(&self, guild_id: Snowflake) -> Vec<Emoji> {
        self.resolve(guild_id, |g| &g.emoji_ids, &self.emojis)
    }

    pub fn guild_stickers(&self, guild_id: Snowflake) -> Vec<Sticker> {
        self.resolve(guild_id, |g| &g.sticker_ids, &self.stickers)
    }

    pub fn guild_voice_states(&self, guild_id: Snowflake) -> Vec<VoiceState> {
        self.voice_states
            .iter()
            .filter(|entry| entry.key().0 == guild_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshot the id set first so no guild entry is held while reading another map
    fn resolve<T, F>(&self, guild_id: Snowflake, ids: F, map: &DashMap<Snowflake, T>) -> Vec<T>
    where
        T: Clone,
        F: Fn(&CachedGuild) -> &std::collections::BTreeSet<Snowflake>,
    {
        let Some(ids) = self.guilds.get(&guild_id).map(|g| ids(g.value()).clone()) else {
            return Vec::new();
        };
        ids.into_iter()
            .filter_map(|id| map.get(&id).map(|v| v.clone()))
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            guilds: self.guilds.len(),
            channels: self.channels.len(),
            threads: self.threads.len(),
            users: self.users.len(),
            members: self.members.len(),
            roles: self.roles.len(),
            emojis: self.emojis.len(),
            stickers: self.stickers.len(),
            voice_states: self.voice_states.len(),
            messages: self.messages.len(),
        }
    }

    /// Whether any guild other than `except`, or the session itself, still references the user
    pub(crate) fn user_referenced(&self, user_id: Snowflake, except: Option<Snowflake>) -> bool {
        self.is_current_user(user_id)
            || self
                .guilds
                .iter()
                .any(|g| Some(g.id()) != except && g.has_member(user_id))
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("EntityCache")
            .field("guilds", &stats.guilds)
            .field("channels", &stats.channels)
            .field("users", &stats.users)
            .field("messages", &stats.messages)
            .finish()
    }
}
