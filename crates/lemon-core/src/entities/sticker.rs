//! Guild and standard stickers

use serde::{Deserialize, Serialize};

use super::user::User;
use crate::error::FromPayload;
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum StickerFormat {
    Png,
    Apng,
    Lottie,
    Gif,
    Unknown(u8),
}

impl From<u8> for StickerFormat {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Png,
            2 => Self::Apng,
            3 => Self::Lottie,
            4 => Self::Gif,
            other => Self::Unknown(other),
        }
    }
}

impl From<StickerFormat> for u8 {
    fn from(format: StickerFormat) -> Self {
        match format {
            StickerFormat::Png => 1,
            StickerFormat::Apng => 2,
            StickerFormat::Lottie => 3,
            StickerFormat::Gif => 4,
            StickerFormat::Unknown(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: Snowflake,
    #[serde(default)]
    pub pack_id: Option<Snowflake>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: String,
    /// 1 = standard, 2 = guild
    #[serde(rename = "type", default)]
    pub kind: u8,
    pub format_type: StickerFormat,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub sort_value: Option<i32>,
}

fn default_available() -> bool {
    true
}

impl FromPayload for Sticker {
    const ENTITY: &'static str = "sticker";
}

impl Sticker {
    /// Comma-separated autocomplete tags
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}
