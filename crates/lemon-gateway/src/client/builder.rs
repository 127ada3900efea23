//! Client builder

use std::sync::Arc;

use lemon_cache::EntityCache;
use lemon_common::ClientConfig;
use tokio::sync::mpsc;

use super::handle::GatewayHandle;
use super::pending::PendingFrames;
use super::Client;
use crate::cache_sync::CacheUpdater;
use crate::dispatcher::Dispatcher;
use crate::events::{EventBus, EventHandler, ANY_EVENT};
use crate::protocol::{IdentifyProperties, PresenceUpdatePayload};
use crate::session::Session;

/// Channel buffer size for handle commands
const COMMAND_BUFFER_SIZE: usize = 100;

/// Wires the cache, bus, and dispatcher together
///
/// ```ignore
/// let client = Client::builder(config)
///     .on("message_create", |event: Arc<GatewayEvent>| async move {
///         tracing::info!(event = %event.name(), "got a message");
///     })
///     .build();
/// client.run().await?;
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    handlers: Vec<(String, Arc<dyn EventHandler>)>,
    properties: IdentifyProperties,
    presence: Option<PresenceUpdatePayload>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            handlers: Vec::new(),
            properties: IdentifyProperties::default(),
            presence: None,
        }
    }

    /// Subscribe `handler` to events named `name`
    #[must_use]
    pub fn on<H>(mut self, name: &str, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.handlers.push((name.to_string(), Arc::new(handler)));
        self
    }

    #[must_use]
    pub fn on_any<H>(self, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.on(ANY_EVENT, handler)
    }

    /// Connection properties sent with identify
    #[must_use]
    pub fn properties(mut self, properties: IdentifyProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Presence to set on identify
    #[must_use]
    pub fn presence(mut self, presence: PresenceUpdatePayload) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn build(self) -> Client {
        let cache = EntityCache::new_shared(self.config.cache.max_messages);
        let bus = Arc::new(EventBus::new());

        // registered first so user handlers see the updated cache
        bus.subscribe_pinned(CacheUpdater::new(Arc::clone(&cache)));
        for (name, handler) in self.handlers {
            bus.subscribe_arc(&name, handler);
        }

        let (tx, commands) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let dispatcher = Dispatcher::new(Arc::clone(&cache), Arc::clone(&bus));

        Client {
            config: self.config,
            cache,
            bus,
            dispatcher,
            session: Session::new(),
            properties: self.properties,
            presence: self.presence,
            commands,
            handle: GatewayHandle::new(tx),
            pending: PendingFrames::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GatewayEvent;
    use crate::session::SessionStatus;

    #[tokio::test]
    async fn test_build_registers_cache_updater_first() {
        let client = ClientBuilder::new(ClientConfig::new("token"))
            .on("resumed", |_event: Arc<GatewayEvent>| async {})
            .build();

        assert_eq!(client.bus().handler_count("resumed"), 2);
        assert_eq!(client.bus().handler_count("message_create"), 1);
        assert_eq!(client.session_status(), SessionStatus::Disconnected);
        assert!(client.handle().is_running());
    }

    #[tokio::test]
    async fn test_unsubscribe_any_keeps_cache_sync() {
        let client = ClientBuilder::new(ClientConfig::new("token"))
            .on_any(|_event: Arc<GatewayEvent>| async {})
            .build();

        assert_eq!(client.bus().unsubscribe("*"), 1);
        let user = serde_json::json!({"id": "1", "username": "zest"});
        assert!(client.dispatcher.dispatch("USER_UPDATE", user).await);
        assert_eq!(
            client.cache().current_user().map(|u| u.username).as_deref(),
            Some("zest")
        );
    }

    #[tokio::test]
    async fn test_user_handler_sees_cache_after_update() {
        let client = ClientBuilder::new(ClientConfig::new("token")).build();
        let cache = Arc::clone(client.cache());
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let slot = Arc::clone(&seen);
        client.bus().subscribe("user_update", move |_event: Arc<GatewayEvent>| {
            let cache = Arc::clone(&cache);
            let slot = Arc::clone(&slot);
            async move {
                *slot.lock() = cache.current_user().map(|u| u.username);
            }
        });

        let user = serde_json::json!({"id": "1", "username": "zest"});
        client.dispatcher.dispatch("USER_UPDATE", user).await;
        assert_eq!(seen.lock().as_deref(), Some("zest"));
    }
}
