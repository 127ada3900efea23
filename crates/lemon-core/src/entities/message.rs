//! Message entity and its reaction bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::reaction::{PartialEmoji, Reaction};
use super::user::User;
use crate::error::{FromPayload, ParseError};
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub footer: Option<EmbedFooter>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tts: bool,
    #[serde(default)]
    pub mention_everyone: bool,
    #[serde(default)]
    pub mentions: Vec<User>,
    #[serde(default)]
    pub mention_roles: Vec<Snowflake>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub webhook_id: Option<Snowflake>,
}

impl FromPayload for Message {
    const ENTITY: &'static str = "message";
}

impl Message {
    /// Overlay a partial `message_update` payload onto this message.
    /// Fields absent from `partial` keep their current value.
    pub fn merge_update(&self, partial: &Value) -> Result<Message, ParseError> {
        let mut merged = serde_json::to_value(self).map_err(|source| ParseError::Invalid {
            entity: Self::ENTITY,
            source,
        })?;
        if let (Value::Object(base), Value::Object(patch)) = (&mut merged, partial) {
            for (key, value) in patch {
                base.insert(key.clone(), value.clone());
            }
        }
        Message::from_value(&merged)
    }

    pub fn reaction(&self, emoji: &PartialEmoji) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.emoji.matches(emoji))
    }

    /// Count one more reaction with `emoji`; `me` marks the current user's own reaction
    pub fn add_reaction(&mut self, emoji: &PartialEmoji, me: bool) {
        if let Some(reaction) = self.reactions.iter_mut().find(|r| r.emoji.matches(emoji)) {
            reaction.count += 1;
            reaction.me |= me;
        } else {
            self.reactions.push(Reaction {
                count: 1,
                me,
                emoji: emoji.clone(),
            });
        }
    }

    /// Count one reaction less; the entry disappears when its count reaches zero
    pub fn remove_reaction(&mut self, emoji: &PartialEmoji, me: bool) {
        let Some(pos) = self.reactions.iter().position(|r| r.emoji.matches(emoji)) else {
            return;
        };
        let reaction = &mut self.reactions[pos];
        reaction.count = reaction.count.saturating_sub(1);
        if me {
            reaction.me = false;
        }
        if reaction.count == 0 {
            self.reactions.remove(pos);
        }
    }

    /// Drop every reaction using `emoji`
    pub fn clear_emoji(&mut self, emoji: &PartialEmoji) {
        self.reactions.retain(|r| !r.emoji.matches(emoji));
    }

    pub fn clear_reactions(&mut self) {
        self.reactions.clear();
    }

    pub fn jump_url(&self) -> String {
        let guild = self
            .guild_id
            .map_or_else(|| "@me".to_string(), |id| id.to_string());
        format!("https://discord.com/channels/{guild}/{}/{}", self.channel_id, self.id)
    }
}
