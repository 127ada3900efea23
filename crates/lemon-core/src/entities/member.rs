//! Member entity - a user's membership in one guild

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;
use crate::error::FromPayload;
use crate::value_objects::Snowflake;

/// Guild member. `guild_id` is absent from payloads nested inside a guild snapshot
/// and is filled in by the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub guild_id: Snowflake,
    pub user: User,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub premium_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub pending: bool,
}

impl FromPayload for Member {
    const ENTITY: &'static str = "member";
}

impl Member {
    /// Attach the owning guild
    #[must_use]
    pub fn with_guild(mut self, guild_id: Snowflake) -> Self {
        self.guild_id = guild_id;
        self
    }

    #[inline]
    pub fn user_id(&self) -> Snowflake {
        self.user.id
    }

    /// Nickname if set, otherwise the user's display name
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or_else(|| self.user.display_name())
    }

    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.roles.contains(&role_id)
    }
}
