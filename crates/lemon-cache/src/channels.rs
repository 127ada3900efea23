//! Channel and thread deltas

use lemon_core::{Channel, Snowflake};

use crate::entity_cache::EntityCache;

impl EntityCache {
    /// Insert or replace a channel or thread and link it to its guild
    pub fn upsert_channel(&self, channel: Channel) {
        let id = channel.id;
        let is_thread = channel.is_thread();
        if let Some(guild_id) = channel.guild_id {
            if let Some(mut guild) = self.guilds.get_mut(&guild_id) {
                if is_thread {
                    guild.thread_ids.insert(id);
                } else {
                    guild.channel_ids.insert(id);
                }
            }
        }
        if is_thread {
            self.threads.insert(id, channel);
        } else {
            self.channels.insert(id, channel);
        }
    }

    /// Remove a channel or thread by id, along with its cached messages.
    ///
    /// Threads under a removed channel go with it.
    pub fn remove_channel(&self, id: Snowflake) -> Option<Channel> {
        let removed = self
            .channels
            .remove(&id)
            .or_else(|| self.threads.remove(&id))
            .map(|(_, channel)| channel)?;

        let orphans: Vec<Snowflake> = if removed.is_thread() {
            Vec::new()
        } else {
            self.threads
                .iter()
                .filter(|t| t.parent_id == Some(id))
                .map(|t| t.id)
                .collect()
        };

        if let Some(guild_id) = removed.guild_id {
            if let Some(mut guild) = self.guilds.get_mut(&guild_id) {
                guild.channel_ids.remove(&id);
                guild.thread_ids.remove(&id);
                for thread_id in &orphans {
                    guild.thread_ids.remove(thread_id);
                }
            }
        }

        let mut dropped = self.remove_channel_messages(id);
        for thread_id in orphans {
            self.threads.remove(&thread_id);
            dropped += self.remove_channel_messages(thread_id);
        }
        tracing::trace!(channel_id = %id, dropped_messages = dropped, "Channel removed from cache");
        Some(removed)
    }
}
