//! User entity - an account as seen by the gateway

use serde::{Deserialize, Serialize};

use crate::error::FromPayload;
use crate::value_objects::Snowflake;

const CDN_URL: &str = "https://cdn.discordapp.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub public_flags: Option<u64>,
}

fn default_discriminator() -> String {
    "0".to_string()
}

impl FromPayload for User {
    const ENTITY: &'static str = "user";
}

impl User {
    /// `username#discriminator`, or the bare username for migrated accounts
    pub fn tag(&self) -> String {
        if self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }

    /// Global display name if set, otherwise the username
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// CDN url of the avatar; animated hashes resolve to gif
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            let ext = if hash.starts_with("a_") { "gif" } else { "png" };
            format!("{CDN_URL}/avatars/{}/{hash}.{ext}", self.id)
        })
    }
}
