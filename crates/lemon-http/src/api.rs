//! Typed endpoints over [`HttpClient::request`]

use lemon_core::{
    Channel, Embed, FromPayload, Guild, Member, Message, PartialEmoji, Role, Snowflake, User,
};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{audit_reason, HttpClient};
use crate::error::HttpResult;
use crate::route;

/// `GET /gateway/bot`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayBot {
    pub url: String,
    pub shards: u32,
    pub session_start_limit: SessionStartLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionStartLimit {
    pub total: u32,
    pub remaining: u32,
    /// Milliseconds until `remaining` resets
    pub reset_after: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

fn default_max_concurrency() -> u32 {
    1
}

/// Body of a create-message request
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tts: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl CreateMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }
}

fn id(name: &'static str, value: Snowflake) -> (&'static str, String) {
    (name, value.to_string())
}

fn decode<T: FromPayload>(value: &Value) -> HttpResult<T> {
    Ok(T::from_value(value)?)
}

fn decode_list<T: FromPayload>(value: Value) -> HttpResult<Vec<T>> {
    match value {
        Value::Array(items) => items.iter().map(decode).collect(),
        other => Ok(vec![decode(&other)?]),
    }
}

impl HttpClient {
    /// Websocket url to connect to
    pub async fn gateway_url(&self) -> HttpResult<String> {
        let value = self
            .request(route::GATEWAY.compile(&[])?, None, HeaderMap::new())
            .await?;
        Ok(serde_json::from_value::<GatewayUrl>(value)?.url)
    }

    pub async fn gateway_bot(&self) -> HttpResult<GatewayBot> {
        let value = self
            .request(route::GATEWAY_BOT.compile(&[])?, None, HeaderMap::new())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn current_user(&self) -> HttpResult<User> {
        let value = self
            .request(route::CURRENT_USER.compile(&[])?, None, HeaderMap::new())
            .await?;
        decode(&value)
    }

    // === Channels ===

    pub async fn get_channel(&self, channel_id: Snowflake) -> HttpResult<Channel> {
        let route = route::CHANNEL.compile(&[id("channel_id", channel_id)])?;
        decode(&self.request(route, None, HeaderMap::new()).await?)
    }

    pub async fn trigger_typing(&self, channel_id: Snowflake) -> HttpResult<()> {
        let route = route::CHANNEL_TYPING.compile(&[id("channel_id", channel_id)])?;
        self.request(route, None, HeaderMap::new()).await?;
        Ok(())
    }

    // === Messages ===

    /// Most recent messages, newest first; `limit` is clamped to 1..=100
    pub async fn get_messages(&self, channel_id: Snowflake, limit: u8) -> HttpResult<Vec<Message>> {
        let base = route::CHANNEL_MESSAGES.compile(&[id("channel_id", channel_id)])?;
        let route = route::CompiledRoute {
            path: format!("{}?limit={}", base.path, limit.clamp(1, 100)),
            ..base
        };
        decode_list(self.request(route, None, HeaderMap::new()).await?)
    }

    pub async fn get_message(&self, channel_id: Snowflake, message_id: Snowflake) -> HttpResult<Message> {
        let route = route::MESSAGE.compile(&[id("channel_id", channel_id), id("message_id", message_id)])?;
        decode(&self.request(route, None, HeaderMap::new()).await?)
    }

    pub async fn create_message(&self, channel_id: Snowflake, message: &CreateMessage) -> HttpResult<Message> {
        let route = route::CREATE_MESSAGE.compile(&[id("channel_id", channel_id)])?;
        let body = serde_json::to_value(message)?;
        decode(&self.request(route, Some(&body), HeaderMap::new()).await?)
    }

    pub async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> HttpResult<Message> {
        let route =
            route::EDIT_MESSAGE.compile(&[id("channel_id", channel_id), id("message_id", message_id)])?;
        let body = json!({ "content": content });
        decode(&self.request(route, Some(&body), HeaderMap::new()).await?)
    }

    pub async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        reason: Option<&str>,
    ) -> HttpResult<()> {
        let route =
            route::DELETE_MESSAGE.compile(&[id("channel_id", channel_id), id("message_id", message_id)])?;
        self.request(route, None, audit_reason(reason)?).await?;
        Ok(())
    }

    pub async fn bulk_delete_messages(
        &self,
        channel_id: Snowflake,
        message_ids: &[Snowflake],
        reason: Option<&str>,
    ) -> HttpResult<()> {
        let route = route::BULK_DELETE.compile(&[id("channel_id", channel_id)])?;
        let body = json!({ "messages": message_ids });
        self.request(route, Some(&body), audit_reason(reason)?).await?;
        Ok(())
    }

    // === Reactions ===

    pub async fn add_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &PartialEmoji,
    ) -> HttpResult<()> {
        let route = route::OWN_REACTION.compile(&[
            id("channel_id", channel_id),
            id("message_id", message_id),
            ("emoji", emoji.route_form()),
        ])?;
        self.request(route, None, HeaderMap::new()).await?;
        Ok(())
    }

    pub async fn remove_own_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &PartialEmoji,
    ) -> HttpResult<()> {
        let route = route::DELETE_OWN_REACTION.compile(&[
            id("channel_id", channel_id),
            id("message_id", message_id),
            ("emoji", emoji.route_form()),
        ])?;
        self.request(route, None, HeaderMap::new()).await?;
        Ok(())
    }

    // === Guilds ===

    pub async fn get_guild(&self, guild_id: Snowflake) -> HttpResult<Guild> {
        let route = route::GUILD.compile(&[id("guild_id", guild_id)])?;
        decode(&self.request(route, None, HeaderMap::new()).await?)
    }

    pub async fn get_guild_roles(&self, guild_id: Snowflake) -> HttpResult<Vec<Role>> {
        let route = route::GUILD_ROLES.compile(&[id("guild_id", guild_id)])?;
        decode_list(self.request(route, None, HeaderMap::new()).await?)
    }

    pub async fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> HttpResult<Member> {
        let route = route::GUILD_MEMBER.compile(&[id("guild_id", guild_id), id("user_id", user_id)])?;
        let member: Member = decode(&self.request(route, None, HeaderMap::new()).await?)?;
        Ok(member.with_guild(guild_id))
    }

    pub async fn add_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: Option<&str>,
    ) -> HttpResult<()> {
        let route = route::ADD_MEMBER_ROLE.compile(&[
            id("guild_id", guild_id),
            id("user_id", user_id),
            id("role_id", role_id),
        ])?;
        self.request(route, None, audit_reason(reason)?).await?;
        Ok(())
    }

    pub async fn remove_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
        reason: Option<&str>,
    ) -> HttpResult<()> {
        let route = route::REMOVE_MEMBER_ROLE.compile(&[
            id("guild_id", guild_id),
            id("user_id", user_id),
            id("role_id", role_id),
        ])?;
        self.request(route, None, audit_reason(reason)?).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct GatewayUrl {
    url: String,
}
