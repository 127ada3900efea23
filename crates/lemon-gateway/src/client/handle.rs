//! Outbound command handle

use tokio::sync::mpsc;

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{
    GatewayMessage, PresenceUpdatePayload, RequestGuildMembersPayload, VoiceStateUpdatePayload,
};

/// Commands from handles to the running client
#[derive(Debug)]
pub(crate) enum Command {
    Send(GatewayMessage),
    Shutdown,
}

/// Cloneable handle for talking to a running [`Client`](super::Client)
///
/// Frames sent before the session is connected are held and flushed once
/// READY or RESUMED arrives.
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    commands: mpsc::Sender<Command>,
}

impl GatewayHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    async fn submit(&self, command: Command) -> GatewayResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| GatewayError::NotRunning)
    }

    /// Queue a raw frame for the gateway
    pub async fn send(&self, frame: GatewayMessage) -> GatewayResult<()> {
        self.submit(Command::Send(frame)).await
    }

    pub async fn update_presence(&self, presence: &PresenceUpdatePayload) -> GatewayResult<()> {
        self.send(GatewayMessage::presence_update(presence)).await
    }

    pub async fn update_voice_state(&self, voice: &VoiceStateUpdatePayload) -> GatewayResult<()> {
        self.send(GatewayMessage::voice_state_update(voice)).await
    }

    /// Members arrive later as `guild_members_chunk` events
    pub async fn request_guild_members(
        &self,
        request: &RequestGuildMembersPayload,
    ) -> GatewayResult<()> {
        self.send(GatewayMessage::request_guild_members(request)).await
    }

    /// Close the socket with 1000 and make `Client::run` return `Ok`
    pub async fn shutdown(&self) -> GatewayResult<()> {
        self.submit(Command::Shutdown).await
    }

    /// False once the client has stopped running
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{OpCode, Status};

    #[tokio::test]
    async fn test_commands_are_queued_as_frames() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = GatewayHandle::new(tx);
        handle
            .update_presence(&PresenceUpdatePayload::new(Status::Idle))
            .await
            .unwrap();
        handle.shutdown().await.unwrap();

        match rx.recv().await {
            Some(Command::Send(frame)) => assert_eq!(frame.op, OpCode::PresenceUpdate),
            other => panic!("expected a frame, got {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(Command::Shutdown)));
    }

    #[tokio::test]
    async fn test_stopped_client_is_not_running() {
        let (tx, rx) = mpsc::channel(1);
        let handle = GatewayHandle::new(tx);
        assert!(handle.is_running());
        drop(rx);
        assert!(!handle.is_running());
        assert!(matches!(handle.shutdown().await, Err(GatewayError::NotRunning)));
    }
}
