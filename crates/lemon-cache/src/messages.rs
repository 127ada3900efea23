//! Message retention and reaction bookkeeping

use dashmap::DashMap;
use lemon_core::{Message, PartialEmoji, Snowflake};
use parking_lot::Mutex;
use std::collections::BTreeSet;

use crate::entity_cache::EntityCache;

/// Bounded message map. Snowflakes sort by creation time, so the lowest id is the oldest message.
pub(crate) struct MessageStore {
    messages: DashMap<Snowflake, Message>,
    order: Mutex<BTreeSet<Snowflake>>,
    capacity: usize,
}

impl MessageStore {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            messages: DashMap::new(),
            order: Mutex::new(BTreeSet::new()),
            capacity,
        }
    }

    pub(crate) fn get(&self, id: Snowflake) -> Option<Message> {
        self.messages.get(&id).map(|m| m.clone())
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    /// Insert or replace, evicting the oldest entries beyond capacity
    pub(crate) fn insert(&self, message: Message) {
        if self.capacity == 0 {
            return;
        }
        let mut order = self.order.lock();
        order.insert(message.id);
        self.messages.insert(message.id, message);
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_first() {
                self.messages.remove(&oldest);
                tracing::trace!(message_id = %oldest, "Evicted message from cache");
            }
        }
    }

    pub(crate) fn remove(&self, id: Snowflake) -> Option<Message> {
        let mut order = self.order.lock();
        order.remove(&id);
        self.messages.remove(&id).map(|(_, m)| m)
    }

    /// Mutate a cached message in place; returns false when it is not cached
    pub(crate) fn modify<F>(&self, id: Snowflake, f: F) -> bool
    where
        F: FnOnce(&mut Message),
    {
        match self.messages.get_mut(&id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// Drop every message matching the predicate
    pub(crate) fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Message) -> bool,
    {
        let mut order = self.order.lock();
        let before = self.messages.len();
        self.messages.retain(|id, message| {
            let drop = predicate(message);
            if drop {
                order.remove(id);
            }
            !drop
        });
        before - self.messages.len()
    }

    pub(crate) fn clear(&self) {
        let mut order = self.order.lock();
        order.clear();
        self.messages.clear();
    }
}

impl EntityCache {
    pub fn insert_message(&self, message: Message) {
        self.messages.insert(message);
    }

    /// Keyed replace; inserts when the message was never cached
    pub fn update_message(&self, message: Message) {
        self.messages.insert(message);
    }

    pub fn remove_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.remove(id)
    }

    /// Remove several messages, returning the ones that were cached
    pub fn remove_messages(&self, ids: &[Snowflake]) -> Vec<Message> {
        ids.iter().filter_map(|&id| self.messages.remove(id)).collect()
    }

    /// Count a reaction by `user_id`; returns false when the message is not cached
    pub fn add_reaction(&self, message_id: Snowflake, user_id: Snowflake, emoji: &PartialEmoji) -> bool {
        let me = self.is_current_user(user_id);
        self.messages
            .modify(message_id, |message| message.add_reaction(emoji, me))
    }

    pub fn remove_reaction(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &PartialEmoji,
    ) -> bool {
        let me = self.is_current_user(user_id);
        self.messages
            .modify(message_id, |message| message.remove_reaction(emoji, me))
    }

    pub fn clear_reactions(&self, message_id: Snowflake) -> bool {
        self.messages.modify(message_id, Message::clear_reactions)
    }

    pub fn clear_reaction_emoji(&self, message_id: Snowflake, emoji: &PartialEmoji) -> bool {
        self.messages
            .modify(message_id, |message| message.clear_emoji(emoji))
    }

    pub(crate) fn remove_channel_messages(&self, channel_id: Snowflake) -> usize {
        self.messages.remove_where(|m| m.channel_id == channel_id)
    }
}
