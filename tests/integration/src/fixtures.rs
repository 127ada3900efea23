//! Gateway payload fixtures
//!
//! JSON builders shaped like real dispatch payloads.

use serde_json::{json, Value};

/// Id of the guild most fixtures belong to
pub const GUILD_ID: u64 = 100;

/// Text channel inside [`GUILD_ID`]
pub const CHANNEL_ID: u64 = 101;

/// Id of the logged-in user
pub const SELF_ID: u64 = 1;

pub fn user(id: u64, name: &str) -> Value {
    json!({"id": id.to_string(), "username": name})
}

/// READY for session `abc`, with [`GUILD_ID`] still unavailable
pub fn ready(resume_url: &str) -> Value {
    json!({
        "v": 9,
        "user": user(SELF_ID, "lemon"),
        "guilds": [{"id": GUILD_ID.to_string(), "unavailable": true}],
        "session_id": "abc",
        "resume_gateway_url": resume_url,
    })
}

pub fn role(id: u64, name: &str) -> Value {
    json!({"id": id.to_string(), "name": name, "permissions": "0", "position": 1})
}

/// Guild with 2 channels, 1 role, and 3 members
pub fn guild_create(id: u64) -> Value {
    json!({
        "id": id.to_string(),
        "name": "Lemon Grove",
        "channels": [
            {"id": CHANNEL_ID.to_string(), "type": 0, "name": "general", "position": 0},
            {"id": (CHANNEL_ID + 1).to_string(), "type": 2, "name": "voice", "position": 1},
        ],
        "roles": [role(7, "zest")],
        "members": [
            {"user": user(SELF_ID, "lemon"), "roles": ["7"]},
            {"user": user(2, "lime"), "roles": []},
            {"user": user(3, "citron"), "roles": []},
        ],
    })
}

pub fn message(id: u64, content: &str) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": CHANNEL_ID.to_string(),
        "guild_id": GUILD_ID.to_string(),
        "author": user(2, "lime"),
        "content": content,
        "timestamp": "2024-05-01T12:00:00+00:00",
    })
}

pub fn message_delete(id: u64) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": CHANNEL_ID.to_string(),
        "guild_id": GUILD_ID.to_string(),
    })
}

pub fn role_update(guild_id: u64, role: Value) -> Value {
    json!({"guild_id": guild_id.to_string(), "role": role})
}
