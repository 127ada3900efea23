//! Heartbeat task
//!
//! One task per live connection. It only reads the sequence and writes heartbeat
//! frames into the connection's outbound queue, so it never blocks the receive loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::SequenceTracker;
use crate::protocol::GatewayMessage;
use crate::transport::Outbound;

/// Why the heartbeat task stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatExit {
    /// The previous heartbeat was still unacknowledged when the next one was due
    Zombie,
    /// The writer is gone
    ChannelClosed,
}

/// Acknowledgement bookkeeping shared between the receive loop and the heartbeat task
#[derive(Debug, Clone)]
pub struct HeartbeatState {
    acked: Arc<AtomicBool>,
    sent_at: Arc<Mutex<Option<Instant>>>,
    latency: Arc<Mutex<Option<Duration>>>,
}

impl HeartbeatState {
    pub fn new() -> Self {
        Self {
            acked: Arc::new(AtomicBool::new(true)),
            sent_at: Arc::new(Mutex::new(None)),
            latency: Arc::new(Mutex::new(None)),
        }
    }

    /// Record an op 11 and the round trip since the last heartbeat
    pub fn ack(&self) {
        self.acked.store(true, Ordering::Release);
        if let Some(sent) = self.sent_at.lock().take() {
            *self.latency.lock() = Some(sent.elapsed());
        }
    }

    pub fn is_acked(&self) -> bool {
        self.acked.load(Ordering::Acquire)
    }

    fn mark_sent(&self) {
        self.acked.store(false, Ordering::Release);
        *self.sent_at.lock() = Some(Instant::now());
    }

    /// Round trip of the last acknowledged heartbeat
    pub fn latency(&self) -> Option<Duration> {
        *self.latency.lock()
    }
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the heartbeat loop: first beat after `interval * jitter`, then every `interval`.
/// The task ends by itself when a beat goes unacknowledged or the writer closes.
pub fn spawn_heartbeat(
    interval: Duration,
    sequence: SequenceTracker,
    state: HeartbeatState,
    outbound: mpsc::Sender<Outbound>,
) -> JoinHandle<HeartbeatExit> {
    let jitter: f64 = rand::random();
    tokio::spawn(async move {
        tokio::time::sleep(interval.mul_f64(jitter)).await;
        loop {
            if !state.is_acked() {
                tracing::warn!(
                    interval_ms = interval.as_millis() as u64,
                    "Heartbeat not acknowledged, closing zombie connection"
                );
                return HeartbeatExit::Zombie;
            }

            let seq = sequence.get();
            state.mark_sent();
            if outbound
                .send(Outbound::Frame(GatewayMessage::heartbeat(seq)))
                .await
                .is_err()
            {
                return HeartbeatExit::ChannelClosed;
            }
            tracing::trace!(seq = ?seq, "Heartbeat sent");

            tokio::time::sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OpCode;

    const INTERVAL: Duration = Duration::from_millis(20);

    async fn next_heartbeat(rx: &mut mpsc::Receiver<Outbound>) -> GatewayMessage {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Some(Outbound::Frame(frame))) => frame,
            other => panic!("expected a heartbeat, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_beats_carry_latest_sequence() {
        let (tx, mut rx) = mpsc::channel(8);
        let sequence = SequenceTracker::new();
        let state = HeartbeatState::new();
        let task = spawn_heartbeat(INTERVAL, sequence.clone(), state.clone(), tx);

        let first = next_heartbeat(&mut rx).await;
        assert_eq!(first.op, OpCode::Heartbeat);
        assert_eq!(first.as_heartbeat_seq(), Some(None));

        sequence.observe(7);
        state.ack();
        let second = next_heartbeat(&mut rx).await;
        assert_eq!(second.as_heartbeat_seq(), Some(Some(7)));
        assert!(state.latency().is_some());

        task.abort();
    }

    #[tokio::test]
    async fn test_missing_ack_ends_as_zombie() {
        let (tx, mut rx) = mpsc::channel(8);
        let task = spawn_heartbeat(INTERVAL, SequenceTracker::new(), HeartbeatState::new(), tx);
        next_heartbeat(&mut rx).await;
        let exit = tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert_eq!(exit, HeartbeatExit::Zombie);
    }

    #[tokio::test]
    async fn test_closed_writer_stops_task() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let task = spawn_heartbeat(INTERVAL, SequenceTracker::new(), HeartbeatState::new(), tx);
        let exit = tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert_eq!(exit, HeartbeatExit::ChannelClosed);
    }

    #[test]
    fn test_state_starts_acknowledged() {
        let state = HeartbeatState::new();
        assert!(state.is_acked());
        state.mark_sent();
        assert!(!state.is_acked());
        state.ack();
        assert!(state.is_acked());
    }
}
