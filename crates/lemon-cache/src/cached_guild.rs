//! Cached guild - metadata plus the identifiers of everything the guild owns

use lemon_core::{Guild, Snowflake, VoiceServer};
use std::collections::BTreeSet;

/// A guild as held by the cache. Nested entities are stored once in the global
/// collections; the guild keeps only their identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedGuild {
    pub guild: Guild,
    pub channel_ids: BTreeSet<Snowflake>,
    pub thread_ids: BTreeSet<Snowflake>,
    pub role_ids: BTreeSet<Snowflake>,
    /// User ids of cached members
    pub member_ids: BTreeSet<Snowflake>,
    pub emoji_ids: BTreeSet<Snowflake>,
    pub sticker_ids: BTreeSet<Snowflake>,
    pub voice_server: Option<VoiceServer>,
    pub unavailable: bool,
}

impl CachedGuild {
    #[must_use]
    pub fn new(guild: Guild) -> Self {
        Self {
            guild,
            channel_ids: BTreeSet::new(),
            thread_ids: BTreeSet::new(),
            role_ids: BTreeSet::new(),
            member_ids: BTreeSet::new(),
            emoji_ids: BTreeSet::new(),
            sticker_ids: BTreeSet::new(),
            voice_server: None,
            unavailable: false,
        }
    }

    #[inline]
    pub fn id(&self) -> Snowflake {
        self.guild.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.guild.name
    }

    #[inline]
    pub fn has_member(&self, user_id: Snowflake) -> bool {
        self.member_ids.contains(&user_id)
    }
}
