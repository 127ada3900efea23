//! Guild entity and the full snapshot delivered by `guild_create`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Channel, Emoji, Member, Role, Sticker, VoiceState};
use crate::error::{FromPayload, ParseError};
use crate::value_objects::Snowflake;

/// Guild metadata without the nested collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub afk_channel_id: Option<Snowflake>,
    #[serde(default)]
    pub afk_timeout: Option<u32>,
    #[serde(default)]
    pub system_channel_id: Option<Snowflake>,
    #[serde(default)]
    pub verification_level: Option<u8>,
    #[serde(default)]
    pub premium_tier: Option<u8>,
    #[serde(default)]
    pub preferred_locale: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub member_count: Option<u64>,
}

impl FromPayload for Guild {
    const ENTITY: &'static str = "guild";
}

impl Guild {
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == Some(user_id)
    }

    #[inline]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Guild the gateway announced but has not delivered yet (or lost to an outage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableGuild {
    pub id: Snowflake,
    #[serde(default)]
    pub unavailable: bool,
}

impl FromPayload for UnavailableGuild {
    const ENTITY: &'static str = "unavailable guild";
}

/// Everything a `guild_create` carries, with `guild_id` filled into every nested record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSnapshot {
    pub guild: Guild,
    pub channels: Vec<Channel>,
    pub threads: Vec<Channel>,
    pub members: Vec<Member>,
    pub roles: Vec<Role>,
    pub emojis: Vec<Emoji>,
    pub stickers: Vec<Sticker>,
    pub voice_states: Vec<VoiceState>,
}

impl GuildSnapshot {
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let guild = Guild::from_value(value)?;
        let guild_id = guild.id;

        let mut channels = Channel::list_from_field(value, "channels")?;
        for channel in &mut channels {
            channel.guild_id = Some(guild_id);
        }
        let mut threads = Channel::list_from_field(value, "threads")?;
        for thread in &mut threads {
            thread.guild_id = Some(guild_id);
        }
        let members = Member::list_from_field(value, "members")?
            .into_iter()
            .map(|m| m.with_guild(guild_id))
            .collect();
        let mut voice_states = VoiceState::list_from_field(value, "voice_states")?;
        for state in &mut voice_states {
            state.guild_id = Some(guild_id);
        }
        let mut stickers = Sticker::list_from_field(value, "stickers")?;
        for sticker in &mut stickers {
            sticker.guild_id = Some(guild_id);
        }

        Ok(Self {
            guild,
            channels,
            threads,
            members,
            roles: Role::list_from_field(value, "roles")?,
            emojis: Emoji::list_from_field(value, "emojis")?,
            stickers,
            voice_states,
        })
    }

    #[inline]
    pub fn id(&self) -> Snowflake {
        self.guild.id
    }
}
