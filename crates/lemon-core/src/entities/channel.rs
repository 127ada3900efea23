//! Channel entity - guild channels, threads, and direct messages

use serde::{Deserialize, Serialize};

use super::user::User;
use crate::error::FromPayload;
use crate::value_objects::{Permissions, Snowflake};

/// Channel type as sent in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildNews,
    GuildStore,
    NewsThread,
    PublicThread,
    PrivateThread,
    GuildStageVoice,
    Unknown(u8),
}

impl ChannelType {
    #[inline]
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::GuildText => 0,
            Self::Dm => 1,
            Self::GuildVoice => 2,
            Self::GroupDm => 3,
            Self::GuildCategory => 4,
            Self::GuildNews => 5,
            Self::GuildStore => 6,
            Self::NewsThread => 10,
            Self::PublicThread => 11,
            Self::PrivateThread => 12,
            Self::GuildStageVoice => 13,
            Self::Unknown(value) => value,
        }
    }

    #[inline]
    pub fn is_thread(self) -> bool {
        matches!(self, Self::NewsThread | Self::PublicThread | Self::PrivateThread)
    }

    #[inline]
    pub fn is_voice(self) -> bool {
        matches!(self, Self::GuildVoice | Self::GuildStageVoice)
    }

    #[inline]
    pub fn is_private(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }
}

impl From<u8> for ChannelType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildNews,
            6 => Self::GuildStore,
            10 => Self::NewsThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::GuildStageVoice,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(kind: ChannelType) -> Self {
        kind.as_u8()
    }
}

/// Whether an overwrite targets a role or a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum OverwriteKind {
    Role,
    Member,
}

impl From<u8> for OverwriteKind {
    fn from(value: u8) -> Self {
        if value == 1 {
            Self::Member
        } else {
            Self::Role
        }
    }
}

impl From<OverwriteKind> for u8 {
    fn from(kind: OverwriteKind) -> Self {
        match kind {
            OverwriteKind::Role => 0,
            OverwriteKind::Member => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: OverwriteKind,
    #[serde(default)]
    pub allow: Permissions,
    #[serde(default)]
    pub deny: Permissions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub auto_archive_duration: u32,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
    #[serde(default)]
    pub last_message_id: Option<Snowflake>,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    #[serde(default)]
    pub rate_limit_per_user: Option<u32>,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
    #[serde(default)]
    pub recipients: Vec<User>,
    /// Creator, for threads
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub thread_metadata: Option<ThreadMetadata>,
}

impl FromPayload for Channel {
    const ENTITY: &'static str = "channel";
}

impl Channel {
    #[inline]
    pub fn is_thread(&self) -> bool {
        self.kind.is_thread()
    }

    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }

    /// Overwrite targeting the given role or member, if any
    pub fn overwrite_for(&self, target: Snowflake) -> Option<&PermissionOverwrite> {
        self.permission_overwrites.iter().find(|o| o.id == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_type_round_trip_numbers() {
        for value in [0u8, 1, 2, 3, 4, 5, 6, 10, 11, 12, 13] {
            assert_eq!(ChannelType::from(value).as_u8(), value);
        }
        assert_eq!(ChannelType::from(15), ChannelType::Unknown(15));
    }

    #[test]
    fn test_thread_kinds() {
        assert!(ChannelType::PublicThread.is_thread());
        assert!(!ChannelType::GuildText.is_thread());
        assert!(ChannelType::GuildStageVoice.is_voice());
        assert!(ChannelType::GroupDm.is_private());
    }

    #[test]
    fn test_parse_channel_with_overwrites() {
        let channel = Channel::from_value(&json!({
            "id": "41",
            "type": 0,
            "guild_id": "1",
            "name": "general",
            "position": 0,
            "permission_overwrites": [
                {"id": "1", "type": 0, "allow": "0", "deny": "2048"}
            ]
        }))
        .unwrap();
        assert_eq!(channel.kind, ChannelType::GuildText);
        assert_eq!(channel.mention(), "<#41>");
        let overwrite = channel.overwrite_for(Snowflake::new(1)).unwrap();
        assert_eq!(overwrite.kind, OverwriteKind::Role);
        assert!(overwrite.deny.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_missing_type_is_error() {
        assert!(Channel::from_value(&json!({"id": "41"})).is_err());
    }

    #[test]
    fn test_serializes_type_as_number() {
        let channel = Channel::from_value(&json!({"id": "9", "type": 11})).unwrap();
        let value = serde_json::to_value(&channel).unwrap();
        assert_eq!(value["type"], json!(11));
    }
}
