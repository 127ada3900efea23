//! Voice state and voice server records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::member::Member;
use crate::error::FromPayload;
use crate::value_objects::Snowflake;

/// A user's voice connection state; `channel_id` is `None` once they leave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceState {
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
    pub user_id: Snowflake,
    #[serde(default)]
    pub member: Option<Member>,
    pub session_id: String,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub self_stream: bool,
    #[serde(default)]
    pub self_video: bool,
    #[serde(default)]
    pub suppress: bool,
    #[serde(default)]
    pub request_to_speak_timestamp: Option<DateTime<Utc>>,
}

impl FromPayload for VoiceState {
    const ENTITY: &'static str = "voice state";
}

impl VoiceState {
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.channel_id.is_some()
    }
}

/// Voice endpoint assigned to a guild; a `None` endpoint means the server is being reallocated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceServer {
    pub token: String,
    pub guild_id: Snowflake,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl FromPayload for VoiceServer {
    const ENTITY: &'static str = "voice server";
}
