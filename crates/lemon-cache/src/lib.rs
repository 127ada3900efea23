//! # lemon-cache
//!
//! In-memory mirror of the remote state, kept current by applying gateway deltas.
//!
//! Every collection is an identifier-keyed concurrent map. Updates are a single keyed
//! replace, so a reader never observes an entity missing mid-update. Guild-scoped
//! collections are tracked as identifier sets on [`CachedGuild`] and resolved through
//! the global maps.
//!
//! ## Example
//!
//! ```ignore
//! use lemon_cache::EntityCache;
//!
//! let cache = EntityCache::new_shared(1000);
//! cache.insert_guild(snapshot);
//! let guild = cache.get_guild(guild_id).expect("cached");
//! assert_eq!(cache.guild_channels(guild_id).len(), guild.channel_ids.len());
//! ```

mod cached_guild;
mod channels;
mod entity_cache;
mod guilds;
mod members;
mod messages;
mod voice;

#[cfg(test)]
mod test_support;

pub use cached_guild::CachedGuild;
pub use entity_cache::{CacheStats, EntityCache, SharedCache};
