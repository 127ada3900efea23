//! Frames held while no session is connected

use std::collections::VecDeque;

use crate::protocol::GatewayMessage;

/// Most frames held before the oldest are dropped
pub(crate) const MAX_PENDING_FRAMES: usize = 100;

#[derive(Debug)]
pub(crate) struct PendingFrames {
    frames: VecDeque<GatewayMessage>,
    capacity: usize,
}

impl PendingFrames {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity,
        }
    }

    /// Queue a frame, dropping the oldest once full
    pub fn push(&mut self, frame: GatewayMessage) {
        if self.capacity == 0 {
            tracing::warn!(op = %frame.op, "Dropping command sent while disconnected");
            return;
        }
        if self.frames.len() == self.capacity {
            if let Some(dropped) = self.frames.pop_front() {
                tracing::warn!(
                    op = %dropped.op,
                    capacity = self.capacity,
                    "Pending command queue full, dropping oldest"
                );
            }
        }
        self.frames.push_back(frame);
    }

    /// Take every queued frame, oldest first
    pub fn drain(&mut self) -> Vec<GatewayMessage> {
        self.frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl Default for PendingFrames {
    fn default() -> Self {
        Self::new(MAX_PENDING_FRAMES)
    }
}
