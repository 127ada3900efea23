//! Session state machine
//!
//! Pure bookkeeping: the client runner feeds it socket and protocol events and
//! asks it what to send next. It owns the resume credentials and the sequence.

use std::time::Duration;

use serde::Serialize;

use super::SequenceTracker;
use crate::protocol::API_VERSION;

/// Where the connection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    AwaitingHello,
    Identifying,
    Resuming,
    Connected,
    Reconnecting,
}

/// First frame to send after Hello
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    Identify,
    Resume { session_id: String, seq: u64 },
}

/// State of one logical gateway session across reconnects
#[derive(Debug)]
pub struct Session {
    status: SessionStatus,
    session_id: Option<String>,
    resume_url: Option<String>,
    heartbeat_interval: Option<Duration>,
    sequence: SequenceTracker,
}

impl Session {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            session_id: None,
            resume_url: None,
            heartbeat_interval: None,
            sequence: SequenceTracker::new(),
        }
    }

    #[inline]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    /// Shared handle on the sequence, for the heartbeat task
    pub fn sequence(&self) -> &SequenceTracker {
        &self.sequence
    }

    /// A session id and at least one dispatch are required to resume
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.get().is_some()
    }

    fn transition(&mut self, next: SessionStatus) {
        if self.status != next {
            tracing::debug!(from = ?self.status, to = ?next, "Session state change");
            self.status = next;
        }
    }

    /// URL for the next connection: the resume URL from READY when resuming,
    /// the configured gateway otherwise
    pub fn connect_url(&self, gateway_url: &str) -> String {
        let base = match (&self.resume_url, self.can_resume()) {
            (Some(url), true) => url.as_str(),
            _ => gateway_url,
        };
        format!(
            "{}/?v={API_VERSION}&encoding=json&compress=zlib-stream",
            base.trim_end_matches('/')
        )
    }

    pub fn begin_connect(&mut self) {
        self.transition(SessionStatus::Connecting);
    }

    pub fn socket_opened(&mut self) {
        self.transition(SessionStatus::AwaitingHello);
    }

    /// Record the heartbeat interval and decide between identify and resume
    pub fn on_hello(&mut self, interval: Duration) -> Handshake {
        self.heartbeat_interval = Some(interval);
        match (self.session_id.clone(), self.sequence.get()) {
            (Some(session_id), Some(seq)) => {
                self.transition(SessionStatus::Resuming);
                Handshake::Resume {
                    session_id,
                    seq,
                }
            }
            _ => {
                self.transition(SessionStatus::Identifying);
                Handshake::Identify
            }
        }
    }

    pub fn on_ready(&mut self, session_id: String, resume_url: Option<String>) {
        self.session_id = Some(session_id);
        self.resume_url = resume_url;
        self.transition(SessionStatus::Connected);
    }

    pub fn on_resumed(&mut self) {
        self.transition(SessionStatus::Connected);
    }

    pub fn observe_sequence(&self, sequence: u64) -> u64 {
        self.sequence.observe(sequence)
    }

    /// Forget the session so the next connection identifies
    pub fn invalidate(&mut self) {
        if self.session_id.is_some() {
            tracing::debug!(session_id = ?self.session_id, "Session invalidated");
        }
        self.session_id = None;
        self.resume_url = None;
        self.sequence.reset();
    }

    pub fn reconnecting(&mut self) {
        self.transition(SessionStatus::Reconnecting);
    }

    pub fn disconnected(&mut self) {
        self.heartbeat_interval = None;
        self.transition(SessionStatus::Disconnected);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
