//! Entity builders shared by the unit tests

use lemon_core::{
    Channel, Emoji, FromPayload, GuildSnapshot, Member, Message, Role, Sticker, UnavailableGuild,
    User, VoiceServer, VoiceState,
};
use serde_json::{json, Value};

pub fn user(id: u64, name: &str) -> User {
    User::from_value(&json!({"id": id.to_string(), "username": name})).unwrap()
}

pub fn unavailable(id: u64) -> UnavailableGuild {
    UnavailableGuild::from_value(&json!({"id": id.to_string(), "unavailable": true})).unwrap()
}

pub fn channel_json(id: u64, kind: u8) -> Value {
    json!({"id": id.to_string(), "type": kind, "name": format!("channel-{id}"), "position": 0})
}

pub fn channel(id: u64, guild_id: u64) -> Channel {
    let mut value = channel_json(id, 0);
    value["guild_id"] = json!(guild_id.to_string());
    Channel::from_value(&value).unwrap()
}

pub fn thread(id: u64, guild_id: u64, parent_id: u64) -> Channel {
    let mut value = channel_json(id, 11);
    value["guild_id"] = json!(guild_id.to_string());
    value["parent_id"] = json!(parent_id.to_string());
    Channel::from_value(&value).unwrap()
}

pub fn member_json(user_id: u64) -> Value {
    json!({"user": {"id": user_id.to_string(), "username": format!("user-{user_id}")}, "roles": []})
}

pub fn member(guild_id: u64, user_id: u64) -> Member {
    let mut value = member_json(user_id);
    value["guild_id"] = json!(guild_id.to_string());
    Member::from_value(&value).unwrap()
}

pub fn role_json(id: u64, name: &str) -> Value {
    json!({"id": id.to_string(), "name": name, "permissions": "0", "position": 1})
}

pub fn role(id: u64, name: &str) -> Role {
    Role::from_value(&role_json(id, name)).unwrap()
}

pub fn emoji(id: u64, name: &str) -> Emoji {
    Emoji::from_value(&json!({"id": id.to_string(), "name": name})).unwrap()
}

pub fn sticker(id: u64, name: &str) -> Sticker {
    Sticker::from_value(&json!({"id": id.to_string(), "name": name, "format_type": 1})).unwrap()
}

pub fn snapshot(id: u64, channels: &[u64], roles: &[u64], members: &[u64]) -> GuildSnapshot {
    GuildSnapshot::from_value(&json!({
        "id": id.to_string(),
        "name": format!("guild-{id}"),
        "channels": channels.iter().map(|&c| channel_json(c, 0)).collect::<Vec<_>>(),
        "roles": roles.iter().map(|&r| role_json(r, "role")).collect::<Vec<_>>(),
        "members": members.iter().map(|&m| member_json(m)).collect::<Vec<_>>(),
    }))
    .unwrap()
}

pub fn message(id: u64, channel_id: u64, content: &str) -> Message {
    Message::from_value(&json!({
        "id": id.to_string(),
        "channel_id": channel_id.to_string(),
        "author": {"id": "1", "username": "author"},
        "content": content,
        "timestamp": "2021-06-01T12:00:00+00:00"
    }))
    .unwrap()
}

pub fn voice_state(guild_id: u64, user_id: u64, channel_id: Option<u64>) -> VoiceState {
    VoiceState::from_value(&json!({
        "guild_id": guild_id.to_string(),
        "user_id": user_id.to_string(),
        "channel_id": channel_id.map(|c| c.to_string()),
        "session_id": "voice-session"
    }))
    .unwrap()
}

pub fn voice_server(guild_id: u64, endpoint: Option<&str>) -> VoiceServer {
    VoiceServer::from_value(&json!({
        "token": "voice-token",
        "guild_id": guild_id.to_string(),
        "endpoint": endpoint
    }))
    .unwrap()
}
