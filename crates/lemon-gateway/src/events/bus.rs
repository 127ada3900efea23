//! Event bus
//!
//! Ordered list of `(event name, handler)` pairs. `publish` awaits every matching
//! handler in subscription order before returning, so a handler registered first
//! (the cache updater) has finished before later handlers see the event.
//!
//! Pinned subscriptions run ahead of every other handler and survive `unsubscribe`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::GatewayEvent;

/// Subscription name matching every event
pub const ANY_EVENT: &str = "*";

/// Receives published events
///
/// Any `Fn(Arc<GatewayEvent>) -> impl Future<Output = ()>` closure is a handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Arc<GatewayEvent>);
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(Arc<GatewayEvent>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, event: Arc<GatewayEvent>) {
        (self)(event).await;
    }
}

struct Subscription {
    name: String,
    handler: Arc<dyn EventHandler>,
    pinned: bool,
}

impl Subscription {
    fn matches(&self, event_name: &str) -> bool {
        self.name == ANY_EVENT || self.name == event_name
    }
}

#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `name` (case-insensitive, or [`ANY_EVENT`])
    pub fn subscribe<H>(&self, name: &str, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.subscribe_arc(name, Arc::new(handler));
    }

    pub fn subscribe_arc(&self, name: &str, handler: Arc<dyn EventHandler>) {
        let name = name.trim().to_ascii_lowercase();
        tracing::debug!(event = %name, "Handler subscribed");
        self.subscriptions.write().push(Subscription {
            name,
            handler,
            pinned: false,
        });
    }

    /// Register a handler for every event that runs before all unpinned handlers
    /// and is never removed by [`EventBus::unsubscribe`]
    pub fn subscribe_pinned<H>(&self, handler: H)
    where
        H: EventHandler + 'static,
    {
        let mut subscriptions = self.subscriptions.write();
        let at = subscriptions.iter().take_while(|s| s.pinned).count();
        tracing::debug!(position = at, "Pinned handler subscribed");
        subscriptions.insert(
            at,
            Subscription {
                name: ANY_EVENT.to_string(),
                handler: Arc::new(handler),
                pinned: true,
            },
        );
    }

    pub fn subscribe_all<H>(&self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.subscribe(ANY_EVENT, handler);
    }

    /// Remove every unpinned handler registered under `name`; returns how many were removed
    pub fn unsubscribe(&self, name: &str) -> usize {
        let name = name.trim().to_ascii_lowercase();
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.pinned || s.name != name);
        before - subscriptions.len()
    }

    /// Handlers that would receive an event named `name`
    pub fn handler_count(&self, name: &str) -> usize {
        self.subscriptions
            .read()
            .iter()
            .filter(|s| s.matches(name))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }

    /// Invoke every matching handler in subscription order, awaiting each one
    pub async fn publish(&self, event: GatewayEvent) {
        let event = Arc::new(event);
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.matches(event.name()))
            .map(|s| Arc::clone(&s.handler))
            .collect();

        tracing::trace!(event = %event.name(), handlers = handlers.len(), "Publishing event");
        for handler in handlers {
            handler.handle(Arc::clone(&event)).await;
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .subscriptions
            .read()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        f.debug_struct("EventBus").field("subscriptions", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl EventHandler {
        let log = Arc::clone(log);
        move |event: Arc<GatewayEvent>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(format!("{tag}:{}", event.name()));
            }
        }
    }

    #[tokio::test]
    async fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let log: Log = Arc::default();

        // the first handler is slow; the second must still run after it
        let slow_log = Arc::clone(&log);
        bus.subscribe("resumed", move |_event: Arc<GatewayEvent>| {
            let log = Arc::clone(&slow_log);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                log.lock().push("first".to_string());
            }
        });
        bus.subscribe("resumed", recorder(&log, "second"));

        bus.publish(GatewayEvent::Resumed).await;
        assert_eq!(*log.lock(), vec!["first".to_string(), "second:resumed".to_string()]);
    }

    #[tokio::test]
    async fn test_only_matching_names_are_invoked() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        bus.subscribe("RESUMED", recorder(&log, "resumed"));
        bus.subscribe("connected", recorder(&log, "connected"));
        bus.subscribe_all(recorder(&log, "any"));

        bus.publish(GatewayEvent::Resumed).await;
        assert_eq!(*log.lock(), vec!["resumed:resumed", "any:resumed"]);
        assert_eq!(bus.handler_count("connected"), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_all_handlers_for_name() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        bus.subscribe("resumed", recorder(&log, "a"));
        bus.subscribe("resumed", recorder(&log, "b"));
        bus.subscribe("connected", recorder(&log, "c"));

        assert_eq!(bus.unsubscribe("resumed"), 2);
        assert_eq!(bus.unsubscribe("resumed"), 0);
        bus.publish(GatewayEvent::Resumed).await;
        assert!(log.lock().is_empty());
        assert!(!bus.is_empty());
    }

    #[tokio::test]
    async fn test_pinned_handler_runs_first_and_survives_unsubscribe() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        bus.subscribe_all(recorder(&log, "any"));
        bus.subscribe_pinned(recorder(&log, "pinned"));

        assert_eq!(bus.unsubscribe(ANY_EVENT), 1);
        bus.subscribe("resumed", recorder(&log, "late"));
        bus.publish(GatewayEvent::Resumed).await;

        assert_eq!(*log.lock(), vec!["pinned:resumed", "late:resumed"]);
        assert_eq!(bus.handler_count("connected"), 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(GatewayEvent::Connected).await;
        assert!(bus.is_empty());
    }

    struct Counter(Mutex<u32>);

    #[async_trait]
    impl EventHandler for Counter {
        async fn handle(&self, _event: Arc<GatewayEvent>) {
            *self.0.lock() += 1;
        }
    }

    #[tokio::test]
    async fn test_struct_handler() {
        let bus = EventBus::new();
        let counter = Arc::new(Counter(Mutex::new(0)));
        bus.subscribe_arc(ANY_EVENT, counter.clone());
        bus.publish(GatewayEvent::Connected).await;
        bus.publish(GatewayEvent::Resumed).await;
        assert_eq!(*counter.0.lock(), 2);
    }
}
