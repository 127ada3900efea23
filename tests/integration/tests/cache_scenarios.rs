//! Cache scenarios driven through the dispatcher and event bus
//!
//! No socket involved: dispatches go straight into a [`Dispatcher`] whose bus
//! has the cache updater subscribed first, the same wiring the client uses.
//!
//! Run with: cargo test -p integration-tests --test cache_scenarios

use std::io::Write;
use std::sync::Arc;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use integration_tests::fixtures::{self, CHANNEL_ID, GUILD_ID};
use lemon_cache::{EntityCache, SharedCache};
use lemon_core::Snowflake;
use lemon_gateway::session::SequenceTracker;
use lemon_gateway::transport::Inflater;
use lemon_gateway::{CacheUpdater, Dispatcher, EventBus, GatewayEvent};
use serde_json::{json, Value};
use tokio::sync::mpsc;

fn setup() -> (SharedCache, Arc<EventBus>, Dispatcher) {
    let cache = EntityCache::new_shared(100);
    let bus = Arc::new(EventBus::new());
    bus.subscribe_pinned(CacheUpdater::new(Arc::clone(&cache)));
    let dispatcher = Dispatcher::new(Arc::clone(&cache), Arc::clone(&bus));
    (cache, bus, dispatcher)
}

async fn with_guild() -> (SharedCache, Arc<EventBus>, Dispatcher) {
    let (cache, bus, dispatcher) = setup();
    assert!(
        dispatcher
            .dispatch("GUILD_CREATE", fixtures::guild_create(GUILD_ID))
            .await
    );
    (cache, bus, dispatcher)
}

fn id(raw: u64) -> Snowflake {
    Snowflake::new(raw)
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[tokio::test]
async fn test_guild_create_populates_cache() {
    let (cache, _bus, _dispatcher) = with_guild().await;

    let guild = cache.get_guild(id(GUILD_ID)).expect("guild cached");
    assert_eq!(guild.name(), "Lemon Grove");
    assert_eq!(cache.guild_channels(id(GUILD_ID)).len(), 2);
    assert_eq!(cache.guild_roles(id(GUILD_ID)).len(), 1);
    assert_eq!(cache.guild_members(id(GUILD_ID)).len(), 3);
    for user_id in [1, 2, 3] {
        assert!(cache.get_user(id(user_id)).is_some(), "user {user_id} missing");
    }
    assert_eq!(
        cache.get_channel(id(CHANNEL_ID)).and_then(|c| c.guild_id),
        Some(id(GUILD_ID))
    );
}

#[tokio::test]
async fn test_deleted_message_reaches_subscriber() {
    let (cache, bus, dispatcher) = with_guild().await;
    let (tx, mut deleted) = mpsc::unbounded_channel();
    bus.subscribe("message_delete", move |event: Arc<GatewayEvent>| {
        if let GatewayEvent::MessageDelete { message, .. } = event.as_ref() {
            let _ = tx.send(message.as_ref().map(|m| m.content.clone()));
        }
        async {}
    });

    assert!(dispatcher.dispatch("MESSAGE_CREATE", fixtures::message(500, "squeeze")).await);
    assert!(cache.get_message(id(500)).is_some());
    assert!(dispatcher.dispatch("MESSAGE_DELETE", fixtures::message_delete(500)).await);

    assert!(cache.get_message(id(500)).is_none());
    assert_eq!(deleted.recv().await.flatten().as_deref(), Some("squeeze"));
}

#[tokio::test]
async fn test_role_update_without_cached_before() {
    let (cache, _bus, dispatcher) = with_guild().await;
    assert!(cache.get_role(id(8)).is_none());

    let applied = dispatcher
        .dispatch(
            "GUILD_ROLE_UPDATE",
            fixtures::role_update(GUILD_ID, fixtures::role(8, "peel")),
        )
        .await;

    assert!(applied);
    assert_eq!(cache.get_role(id(8)).map(|r| r.name).as_deref(), Some("peel"));
    assert_eq!(cache.guild_roles(id(GUILD_ID)).len(), 2);
}

// ============================================================================
// Round trips
// ============================================================================

#[tokio::test]
async fn test_create_then_delete_leaves_no_entry() {
    let (cache, _bus, dispatcher) = with_guild().await;
    let guild = GUILD_ID.to_string();

    let channel = json!({"id": "150", "type": 0, "guild_id": guild, "name": "pulp"});
    assert!(dispatcher.dispatch("CHANNEL_CREATE", channel.clone()).await);
    assert!(cache.get_channel(id(150)).is_some());
    assert!(dispatcher.dispatch("CHANNEL_DELETE", channel).await);
    assert!(cache.get_channel(id(150)).is_none());
    assert_eq!(cache.guild_channels(id(GUILD_ID)).len(), 2);

    let thread = json!({
        "id": "300", "type": 11, "guild_id": guild, "parent_id": CHANNEL_ID.to_string(), "name": "seeds",
    });
    assert!(dispatcher.dispatch("THREAD_CREATE", thread.clone()).await);
    assert!(cache.get_thread(id(300)).is_some());
    assert!(dispatcher.dispatch("THREAD_DELETE", thread).await);
    assert!(cache.get_thread(id(300)).is_none());

    let role = json!({"guild_id": guild, "role": fixtures::role(9, "rind")});
    assert!(dispatcher.dispatch("GUILD_ROLE_CREATE", role).await);
    assert!(cache.get_role(id(9)).is_some());
    let delete = json!({"guild_id": guild, "role_id": "9"});
    assert!(dispatcher.dispatch("GUILD_ROLE_DELETE", delete).await);
    assert!(cache.get_role(id(9)).is_none());

    let member = json!({"guild_id": guild, "user": fixtures::user(4, "yuzu"), "roles": []});
    assert!(dispatcher.dispatch("GUILD_MEMBER_ADD", member).await);
    assert!(cache.get_member(id(GUILD_ID), id(4)).is_some());
    let removal = json!({"guild_id": guild, "user": fixtures::user(4, "yuzu")});
    assert!(dispatcher.dispatch("GUILD_MEMBER_REMOVE", removal).await);
    assert!(cache.get_member(id(GUILD_ID), id(4)).is_none());

    assert!(dispatcher.dispatch("GUILD_DELETE", json!({"id": guild})).await);
    assert!(cache.get_guild(id(GUILD_ID)).is_none());
    assert!(cache.get_channel(id(CHANNEL_ID)).is_none());
    assert!(cache.guild_members(id(GUILD_ID)).is_empty());
}

#[tokio::test]
async fn test_channel_delete_takes_its_threads() {
    let (cache, _bus, dispatcher) = with_guild().await;
    let thread = json!({
        "id": "310", "type": 11, "guild_id": GUILD_ID.to_string(),
        "parent_id": CHANNEL_ID.to_string(), "name": "pith",
    });
    assert!(dispatcher.dispatch("THREAD_CREATE", thread).await);
    let mut message = fixtures::message(600, "in the thread");
    message["channel_id"] = json!("310");
    assert!(dispatcher.dispatch("MESSAGE_CREATE", message).await);
    assert!(cache.get_message(id(600)).is_some());

    let channel = json!({"id": CHANNEL_ID.to_string(), "type": 0, "guild_id": GUILD_ID.to_string()});
    assert!(dispatcher.dispatch("CHANNEL_DELETE", channel).await);

    assert!(cache.get_thread(id(310)).is_none());
    assert!(cache.get_message(id(600)).is_none());
    assert!(cache.guild_threads(id(GUILD_ID)).is_empty());
}

#[tokio::test]
async fn test_updates_insert_unknown_entities() {
    let (cache, _bus, dispatcher) = with_guild().await;

    let channel = json!({"id": "160", "type": 0, "guild_id": GUILD_ID.to_string(), "name": "zest"});
    assert!(dispatcher.dispatch("CHANNEL_UPDATE", channel).await);
    assert_eq!(
        cache.get_channel(id(160)).and_then(|c| c.name).as_deref(),
        Some("zest")
    );

    let member = json!({
        "guild_id": GUILD_ID.to_string(),
        "user": fixtures::user(5, "kumquat"),
        "roles": ["7"],
        "nick": "kq",
    });
    assert!(dispatcher.dispatch("GUILD_MEMBER_UPDATE", member).await);
    let cached = cache.get_member(id(GUILD_ID), id(5)).expect("member inserted");
    assert_eq!(cached.nick.as_deref(), Some("kq"));
}

#[tokio::test]
async fn test_events_for_uncached_guild_are_dropped() {
    let (cache, _bus, dispatcher) = setup();
    let role = fixtures::role_update(GUILD_ID, fixtures::role(8, "peel"));
    assert!(!dispatcher.dispatch("GUILD_ROLE_UPDATE", role).await);
    assert!(cache.get_role(id(8)).is_none());
}

// ============================================================================
// Transport properties
// ============================================================================

fn compress(frames: &[Value]) -> Vec<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    frames
        .iter()
        .map(|frame| {
            encoder.write_all(frame.to_string().as_bytes()).unwrap();
            encoder.flush().unwrap();
            std::mem::take(encoder.get_mut())
        })
        .collect()
}

#[test]
fn test_chunked_delivery_matches_single_delivery() {
    let frames = vec![
        json!({"op": 10, "d": {"heartbeat_interval": 41250}}),
        json!({"op": 0, "s": 1, "t": "GUILD_CREATE", "d": fixtures::guild_create(GUILD_ID)}),
        json!({"op": 0, "s": 2, "t": "MESSAGE_CREATE", "d": fixtures::message(500, "squeeze")}),
    ];
    let compressed = compress(&frames);

    let mut whole = Inflater::new();
    let single: Vec<Vec<u8>> = compressed
        .iter()
        .map(|bytes| whole.push(bytes).unwrap().expect("complete frame"))
        .collect();

    let mut split = Inflater::new();
    let mut chunked = Vec::new();
    for bytes in &compressed {
        let mut out = None;
        for piece in bytes.chunks(5) {
            assert!(out.is_none(), "frame completed before its last chunk");
            out = split.push(piece).unwrap();
        }
        chunked.push(out.expect("complete frame"));
    }

    assert_eq!(single, chunked);
    for (bytes, frame) in single.iter().zip(&frames) {
        assert_eq!(&serde_json::from_slice::<Value>(bytes).unwrap(), frame);
    }
}

#[test]
fn test_sequence_never_decreases() {
    let tracker = SequenceTracker::new();
    let mut highest = 0;
    for seq in [3, 1, 7, 7, 2, 9, 4, 8] {
        highest = highest.max(seq);
        tracker.observe(seq);
        assert_eq!(tracker.get(), Some(highest));
    }
}
