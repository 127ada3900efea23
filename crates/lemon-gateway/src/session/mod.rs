//! Gateway session: state machine, sequence tracking, and heartbeat

mod heartbeat;
mod sequence;
mod state;

pub use heartbeat::{spawn_heartbeat, HeartbeatExit, HeartbeatState};
pub use sequence::SequenceTracker;
pub use state::{Handshake, Session, SessionStatus};
