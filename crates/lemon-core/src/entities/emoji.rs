//! Custom guild emoji

use serde::{Deserialize, Serialize};

use super::user::User;
use crate::error::FromPayload;
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub id: Snowflake,
    #[serde(default)]
    pub name: Option<String>,
    /// Roles allowed to use the emoji; empty means everyone
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub require_colons: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl FromPayload for Emoji {
    const ENTITY: &'static str = "emoji";
}

impl Emoji {
    /// Message markup, e.g. `<:lemon:123>` or `<a:spin:456>`
    pub fn markup(&self) -> String {
        let prefix = if self.animated { "a" } else { "" };
        format!("<{prefix}:{}:{}>", self.name.as_deref().unwrap_or("_"), self.id)
    }
}
