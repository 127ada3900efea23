//! Gateway client
//!
//! [`Client::run`] owns the session across reconnects. Each pass opens one
//! connection, drives the handshake and the receive loop until the
//! connection ends, then classifies the error: fatal errors are returned,
//! resumable ones keep the session, everything else clears it so the next
//! connection identifies. Reconnects back off linearly.

mod builder;
mod connection;
mod handle;
mod pending;

pub use builder::ClientBuilder;
pub use handle::GatewayHandle;

use std::sync::Arc;
use std::time::Duration;

use lemon_cache::SharedCache;
use lemon_common::ClientConfig;
use lemon_core::FromPayload;
use serde_json::Value;
use tokio::sync::mpsc;

use self::connection::Connection;
use self::handle::Command;
use self::pending::PendingFrames;
use crate::dispatcher::Dispatcher;
use crate::error::{GatewayError, GatewayResult};
use crate::events::{EventBus, GatewayEvent};
use crate::protocol::{
    GatewayMessage, IdentifyPayload, IdentifyProperties, OpCode, PresenceUpdatePayload,
    ReadyPayload, ResumePayload,
};
use crate::session::{Handshake, Session, SessionStatus};

/// Close code sent on a requested shutdown
const NORMAL_CLOSURE: u16 = 1000;

pub struct Client {
    config: ClientConfig,
    cache: SharedCache,
    bus: Arc<EventBus>,
    dispatcher: Dispatcher,
    session: Session,
    properties: IdentifyProperties,
    presence: Option<PresenceUpdatePayload>,
    commands: mpsc::Receiver<Command>,
    handle: GatewayHandle,
    /// Frames submitted before the session was connected
    pending: PendingFrames,
}

impl Client {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn handle(&self) -> GatewayHandle {
        self.handle.clone()
    }

    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Run until shutdown or a fatal error
    ///
    /// # Errors
    /// Returns the fatal close (`Authentication`, `Fatal`) or
    /// `ReconnectExhausted` once the configured attempt cap is hit.
    pub async fn run(mut self) -> GatewayResult<()> {
        let mut attempt: u32 = 0;

        loop {
            let outcome = self.run_connection().await;
            let established = self.session.status() == SessionStatus::Connected;
            self.session.disconnected();

            let err = match outcome {
                Ok(()) => {
                    tracing::info!("Gateway client shut down");
                    self.bus
                        .publish(GatewayEvent::Disconnected {
                            code: Some(NORMAL_CLOSURE),
                            resumable: false,
                        })
                        .await;
                    return Ok(());
                }
                Err(err) => err,
            };

            let resumable = err.is_resumable();
            self.bus
                .publish(GatewayEvent::Disconnected {
                    code: err.close_code(),
                    resumable,
                })
                .await;

            if err.is_fatal() {
                tracing::error!(error = %err, "Gateway connection failed permanently");
                return Err(err);
            }
            if !resumable {
                self.session.invalidate();
            }

            if established {
                attempt = 0;
            }
            attempt += 1;
            if self.config.reconnect.exhausted(attempt) {
                tracing::error!(attempts = attempt - 1, "Reconnect attempts exhausted");
                return Err(GatewayError::ReconnectExhausted {
                    attempts: attempt - 1,
                });
            }

            let delay = self.config.reconnect.delay_for(attempt);
            tracing::warn!(
                error = %err,
                attempt,
                delay_ms = delay.as_millis() as u64,
                resumable,
                "Gateway connection lost, reconnecting"
            );
            self.session.reconnecting();
            self.bus
                .publish(GatewayEvent::Reconnecting { attempt, delay })
                .await;

            if self.backoff(delay).await {
                tracing::info!("Gateway client shut down during backoff");
                return Ok(());
            }
        }
    }

    /// Sleep between attempts, still accepting commands. Returns true on shutdown.
    async fn backoff(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return false,
                command = self.commands.recv() => match command {
                    Some(Command::Send(frame)) => self.pending.push(frame),
                    Some(Command::Shutdown) => return true,
                    // the client holds a sender, so the channel never closes here
                    None => {
                        (&mut sleep).await;
                        return false;
                    }
                },
            }
        }
    }

    /// Drive one connection from socket open until it ends; `Ok` only on shutdown
    async fn run_connection(&mut self) -> GatewayResult<()> {
        self.session.begin_connect();
        let url = self.session.connect_url(&self.config.gateway.url);
        tracing::info!(url = %url, resuming = self.session.can_resume(), "Connecting to gateway");

        let mut conn = Connection::open(&url).await?;
        self.session.socket_opened();

        loop {
            tokio::select! {
                frame = conn.recv() => {
                    if let Some(frame) = frame? {
                        self.handle_frame(&mut conn, frame).await?;
                    }
                }
                command = self.commands.recv() => match command {
                    Some(Command::Send(frame)) => {
                        if self.session.status() == SessionStatus::Connected {
                            conn.send(frame).await?;
                        } else {
                            self.pending.push(frame);
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        conn.close(NORMAL_CLOSURE).await;
                        return Ok(());
                    }
                },
            }
        }
    }

    async fn handle_frame(&mut self, conn: &mut Connection, frame: GatewayMessage) -> GatewayResult<()> {
        if let Some(seq) = frame.s {
            self.session.observe_sequence(seq);
        }

        let op = frame.op;
        match op {
            OpCode::Dispatch => self.handle_dispatch(conn, frame).await?,
            OpCode::Hello => {
                let hello = frame
                    .as_hello()
                    .ok_or_else(|| GatewayError::Decode("hello without heartbeat_interval".to_string()))?;
                let interval = hello.interval();
                let first = match self.session.on_hello(interval) {
                    Handshake::Identify => {
                        tracing::debug!("Identifying");
                        GatewayMessage::identify(&self.identify_payload())
                    }
                    Handshake::Resume { session_id, seq } => {
                        tracing::debug!(session_id = %session_id, seq, "Resuming session");
                        GatewayMessage::resume(&ResumePayload {
                            token: self.config.auth.token.clone(),
                            session_id,
                            seq,
                        })
                    }
                };
                conn.send(first).await?;
                conn.start_heartbeat(interval, self.session.sequence().clone());
            }
            OpCode::HeartbeatAck => {
                conn.ack_heartbeat();
                tracing::trace!(latency = ?conn.latency(), "Heartbeat acknowledged");
            }
            OpCode::Heartbeat => {
                conn.send(GatewayMessage::heartbeat(self.session.sequence().get()))
                    .await?;
            }
            OpCode::Reconnect => {
                tracing::info!("Gateway requested a reconnect");
                return Err(GatewayError::ReconnectRequested);
            }
            OpCode::InvalidSession => {
                let resumable = frame.as_invalid_session().unwrap_or(false);
                tracing::info!(resumable, "Session invalidated by the gateway");
                return Err(if resumable {
                    GatewayError::ReconnectRequested
                } else {
                    GatewayError::SessionInvalidated
                });
            }
            other => tracing::debug!(op = %other, "Ignoring client-only opcode"),
        }
        Ok(())
    }

    async fn handle_dispatch(&mut self, conn: &mut Connection, frame: GatewayMessage) -> GatewayResult<()> {
        let Some(name) = frame.t else {
            tracing::warn!(seq = ?frame.s, "Dropping dispatch without an event name");
            return Ok(());
        };
        let data = frame.d.unwrap_or(Value::Null);

        match name.to_ascii_lowercase().as_str() {
            "ready" => {
                let ready = ReadyPayload::from_value(&data)?;
                tracing::info!(
                    session_id = %ready.session_id,
                    user = %ready.user.id,
                    guilds = ready.guilds.len(),
                    "Session ready"
                );
                self.session
                    .on_ready(ready.session_id.clone(), ready.resume_gateway_url.clone());
                self.bus.publish(GatewayEvent::Ready(Box::new(ready))).await;
                self.on_connected(conn).await
            }
            "resumed" => {
                tracing::info!(session_id = ?self.session.session_id(), "Session resumed");
                self.session.on_resumed();
                self.bus.publish(GatewayEvent::Resumed).await;
                self.on_connected(conn).await
            }
            _ => {
                self.dispatcher.dispatch(&name, data).await;
                Ok(())
            }
        }
    }

    async fn on_connected(&mut self, conn: &Connection) -> GatewayResult<()> {
        self.bus.publish(GatewayEvent::Connected).await;
        for frame in self.pending.drain() {
            conn.send(frame).await?;
        }
        Ok(())
    }

    fn identify_payload(&self) -> IdentifyPayload {
        let gateway = &self.config.gateway;
        let mut payload = IdentifyPayload::new(self.config.auth.token.clone(), gateway.intents)
            .with_compress(gateway.compress)
            .with_large_threshold(gateway.large_threshold);
        payload.properties = self.properties.clone();
        if let Some(presence) = &self.presence {
            payload = payload.with_presence(presence.clone());
        }
        payload
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .field("bus", &self.bus)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
