//! Last-seen dispatch sequence, shared with the heartbeat task

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic sequence counter. Zero means no dispatch has been seen yet;
/// the gateway numbers dispatches from 1.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    last: Arc<AtomicU64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming sequence; returns the sequence now in effect.
    /// A sequence lower than one already seen never moves the counter back.
    pub fn observe(&self, sequence: u64) -> u64 {
        let previous = self.last.fetch_max(sequence, Ordering::AcqRel);
        previous.max(sequence)
    }

    pub fn get(&self) -> Option<u64> {
        match self.last.load(Ordering::Acquire) {
            0 => None,
            seq => Some(seq),
        }
    }

    pub fn reset(&self) {
        self.last.store(0, Ordering::Release);
    }
}
