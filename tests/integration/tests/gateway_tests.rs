//! Gateway client integration tests
//!
//! Each test runs a real client against the in-process fake gateway, which
//! compresses everything it sends as a zlib stream.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;

use integration_tests::{fixtures, test_config, EventLog, FakeGateway, GatewayPeer, WAIT_TIMEOUT};
use lemon_core::Snowflake;
use lemon_gateway::protocol::{GatewayMessage, OpCode, PresenceUpdatePayload, Status};
use lemon_gateway::{Client, GatewayError, GatewayEvent, GatewayResult};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const LONG_INTERVAL_MS: u64 = 45_000;

struct Running {
    gateway: FakeGateway,
    client: Client,
    events: EventLog,
}

async fn setup() -> Running {
    let gateway = FakeGateway::start().await.expect("Failed to start fake gateway");
    let client = Client::builder(test_config(&gateway.url())).build();
    let events = EventLog::attach(client.bus());
    Running {
        gateway,
        client,
        events,
    }
}

/// Hello, expect identify, send READY
async fn identify(peer: &mut GatewayPeer, resume_url: &str, interval_ms: u64) {
    peer.hello(interval_ms).await.unwrap();
    let frame = peer.recv().await.unwrap();
    let identify = frame.as_identify().expect("expected identify");
    assert_eq!(identify.token, "token");
    peer.dispatch("READY", fixtures::ready(resume_url)).await.unwrap();
}

async fn finish(handle: JoinHandle<GatewayResult<()>>) -> GatewayResult<()> {
    tokio::time::timeout(WAIT_TIMEOUT, handle)
        .await
        .expect("client did not stop")
        .expect("client task panicked")
}

// ============================================================================
// Handshake and dispatch
// ============================================================================

#[tokio::test]
async fn test_identify_ready_and_dispatch() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let cache = Arc::clone(client.cache());
    let handle = client.handle();

    let (tx, mut seen) = mpsc::unbounded_channel();
    let lookup = Arc::clone(&cache);
    client
        .bus()
        .subscribe("message_create", move |event: Arc<GatewayEvent>| {
            if let GatewayEvent::MessageCreate(message) = event.as_ref() {
                let _ = tx.send(lookup.get_message(message.id).map(|m| m.content));
            }
            async {}
        });

    // queued before the session exists, flushed after READY
    handle
        .update_presence(&PresenceUpdatePayload::new(Status::Idle))
        .await
        .unwrap();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    assert!(peer.path.contains("encoding=json"));
    assert!(peer.path.contains("compress=zlib-stream"));
    identify(&mut peer, &gateway.resume_url(), LONG_INTERVAL_MS).await;

    assert_eq!(peer.recv().await.unwrap().op, OpCode::PresenceUpdate);
    assert_eq!(events.wait_for("ready").await.unwrap(), Vec::<String>::new());
    assert_eq!(events.next().await.unwrap(), "connected");

    peer.dispatch("GUILD_CREATE", fixtures::guild_create(fixtures::GUILD_ID))
        .await
        .unwrap();
    peer.dispatch_chunked("MESSAGE_CREATE", fixtures::message(500, "squeeze"), 3)
        .await
        .unwrap();

    let cached = tokio::time::timeout(WAIT_TIMEOUT, seen.recv()).await.unwrap();
    assert_eq!(cached.flatten().as_deref(), Some("squeeze"));
    assert_eq!(events.next().await.unwrap(), "guild_create");
    assert_eq!(events.next().await.unwrap(), "message_create");

    let guild_id = Snowflake::new(fixtures::GUILD_ID);
    assert!(cache.get_guild(guild_id).is_some());
    assert!(!cache.is_unavailable(guild_id));
    assert_eq!(cache.guild_channels(guild_id).len(), 2);
    assert_eq!(
        cache.current_user().map(|u| u.username).as_deref(),
        Some("lemon")
    );

    handle.shutdown().await.unwrap();
    assert_eq!(peer.expect_close().await.unwrap(), Some(1000));
    finish(run).await.unwrap();
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_text_frames_are_accepted() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    peer.send_text(&GatewayMessage::hello(LONG_INTERVAL_MS)).await.unwrap();
    assert_eq!(peer.recv().await.unwrap().op, OpCode::Identify);
    peer.send_text(&GatewayMessage::dispatch("READY", 1, fixtures::ready(&gateway.resume_url())))
        .await
        .unwrap();
    events.wait_for("connected").await.unwrap();

    handle.shutdown().await.unwrap();
    finish(run).await.unwrap();
}

#[tokio::test]
async fn test_heartbeat_reports_highest_sequence() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    identify(&mut peer, &gateway.resume_url(), 300).await;
    peer.set_sequence(4);
    peer.dispatch("TYPING_START", json!({"channel_id": "101"})).await.unwrap();
    // delivered out of order: a lower sequence after 5
    peer.set_sequence(2);
    peer.dispatch("TYPING_START", json!({"channel_id": "101"})).await.unwrap();
    events.wait_for("typing_start").await.unwrap();
    events.wait_for("typing_start").await.unwrap();

    let mut reported = None;
    for _ in 0..10 {
        reported = peer.next_heartbeat().await.unwrap();
        if reported == Some(5) {
            break;
        }
    }
    assert_eq!(reported, Some(5));

    handle.shutdown().await.unwrap();
    finish(run).await.unwrap();
}

// ============================================================================
// Reconnect and resume
// ============================================================================

#[tokio::test]
async fn test_resumable_close_resumes_session() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let cache = Arc::clone(client.cache());
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    identify(&mut peer, &gateway.resume_url(), LONG_INTERVAL_MS).await;
    let last = peer
        .dispatch("GUILD_CREATE", fixtures::guild_create(fixtures::GUILD_ID))
        .await
        .unwrap();
    events.wait_for("guild_create").await.unwrap();
    peer.close(4000).await.unwrap();

    assert_eq!(events.next().await.unwrap(), "disconnected");
    assert_eq!(events.next().await.unwrap(), "reconnecting");

    let mut resumed = gateway.next_connection().await.unwrap();
    assert!(resumed.is_resume_url());
    resumed.hello(LONG_INTERVAL_MS).await.unwrap();
    let resume = resumed.recv().await.unwrap().as_resume().expect("expected resume");
    assert_eq!(resume.session_id, "abc");
    assert_eq!(resume.seq, last);
    assert_eq!(resume.token, "token");

    resumed.set_sequence(last);
    resumed.dispatch("RESUMED", json!({})).await.unwrap();
    assert_eq!(events.next().await.unwrap(), "resumed");
    assert_eq!(events.next().await.unwrap(), "connected");
    assert!(cache.get_guild(Snowflake::new(fixtures::GUILD_ID)).is_some());

    handle.shutdown().await.unwrap();
    finish(run).await.unwrap();
}

#[tokio::test]
async fn test_reconnect_request_resumes_session() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    identify(&mut peer, &gateway.resume_url(), LONG_INTERVAL_MS).await;
    events.wait_for("connected").await.unwrap();
    peer.send(&GatewayMessage::reconnect()).await.unwrap();

    let mut next = gateway.next_connection().await.unwrap();
    next.hello(LONG_INTERVAL_MS).await.unwrap();
    assert_eq!(next.recv().await.unwrap().op, OpCode::Resume);

    handle.shutdown().await.unwrap();
    finish(run).await.unwrap();
}

#[tokio::test]
async fn test_invalid_session_identifies_again() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    identify(&mut peer, &gateway.resume_url(), LONG_INTERVAL_MS).await;
    events.wait_for("connected").await.unwrap();
    peer.send(&GatewayMessage::invalid_session(false)).await.unwrap();

    let mut fresh = gateway.next_connection().await.unwrap();
    assert!(!fresh.is_resume_url());
    fresh.hello(LONG_INTERVAL_MS).await.unwrap();
    assert_eq!(fresh.recv().await.unwrap().op, OpCode::Identify);

    handle.shutdown().await.unwrap();
    finish(run).await.unwrap();
}

#[tokio::test]
async fn test_zombie_connection_is_replaced() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap().without_heartbeat_acks();
    identify(&mut peer, &gateway.resume_url(), 200).await;
    events.wait_for("connected").await.unwrap();

    let skipped = events.wait_for("reconnecting").await.unwrap();
    assert_eq!(skipped, vec!["disconnected".to_string()]);

    let mut next = gateway.next_connection().await.unwrap();
    assert!(next.is_resume_url());
    next.hello(LONG_INTERVAL_MS).await.unwrap();
    let resume = next.recv().await.unwrap().as_resume().expect("expected resume");
    assert_eq!(resume.seq, 1);

    handle.shutdown().await.unwrap();
    finish(run).await.unwrap();
}

// ============================================================================
// Fatal closes
// ============================================================================

#[tokio::test]
async fn test_authentication_failure_is_fatal() {
    let Running {
        mut gateway,
        client,
        mut events,
    } = setup().await;
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    peer.hello(LONG_INTERVAL_MS).await.unwrap();
    assert_eq!(peer.recv().await.unwrap().op, OpCode::Identify);
    peer.close(4004).await.unwrap();

    let result = finish(run).await;
    assert!(matches!(result, Err(GatewayError::Authentication)));
    assert_eq!(events.next().await.unwrap(), "disconnected");
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_shutdown_during_handshake() {
    let Running {
        mut gateway,
        client,
        ..
    } = setup().await;
    let handle = client.handle();
    let run = tokio::spawn(client.run());

    let mut peer = gateway.next_connection().await.unwrap();
    handle.shutdown().await.unwrap();
    assert_eq!(peer.expect_close().await.unwrap(), Some(1000));
    finish(run).await.unwrap();
}
