//! Reactions on messages and the reaction delta payload

use serde::{Deserialize, Serialize};

use super::member::Member;
use crate::error::FromPayload;
use crate::value_objects::Snowflake;

/// Emoji as referenced by a reaction: custom emoji carry an id, unicode emoji only a name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialEmoji {
    #[serde(default)]
    pub id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub animated: bool,
}

impl PartialEmoji {
    #[must_use]
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            animated: false,
        }
    }

    #[must_use]
    pub fn custom(id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            animated: false,
        }
    }

    /// Custom emoji compare by id, unicode emoji by name
    pub fn matches(&self, other: &PartialEmoji) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }

    /// Form used in REST reaction routes: `name:id` or the unicode character
    pub fn route_form(&self) -> String {
        match self.id {
            Some(id) => format!("{}:{id}", self.name.as_deref().unwrap_or("_")),
            None => self.name.clone().unwrap_or_default(),
        }
    }
}

/// Aggregated reaction on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub count: u32,
    /// Whether the current user reacted
    #[serde(default)]
    pub me: bool,
    pub emoji: PartialEmoji,
}

/// Payload of `message_reaction_add` / `message_reaction_remove`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub member: Option<Member>,
    pub emoji: PartialEmoji,
}

impl FromPayload for ReactionEvent {
    const ENTITY: &'static str = "reaction";
}

impl FromPayload for PartialEmoji {
    const ENTITY: &'static str = "emoji";
}
