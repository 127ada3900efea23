//! Voice state and voice server deltas

use lemon_core::{VoiceServer, VoiceState};

use crate::entity_cache::EntityCache;

impl EntityCache {
    /// Apply a voice state: a state without a channel means the user left and is removed.
    /// Returns the previous state, if any.
    pub fn update_voice_state(&self, state: VoiceState) -> Option<VoiceState> {
        let guild_id = state.guild_id?;
        let key = (guild_id, state.user_id);
        if let Some(member) = state.member.clone() {
            self.upsert_member(member.with_guild(guild_id));
        }
        if state.is_connected() {
            self.voice_states.insert(key, state)
        } else {
            self.voice_states.remove(&key).map(|(_, previous)| previous)
        }
    }

    /// Record the guild's voice endpoint; a server without endpoint clears it.
    /// Returns false when the guild is not cached.
    pub fn set_voice_server(&self, server: VoiceServer) -> bool {
        let Some(mut guild) = self.guilds.get_mut(&server.guild_id) else {
            return false;
        };
        guild.voice_server = server.endpoint.is_some().then_some(server);
        true
    }
}
