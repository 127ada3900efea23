//! One live WebSocket connection
//!
//! Owns the read half of the socket, the writer task that forwards the outbound
//! queue to the write half, the heartbeat task, and the zlib-stream context.
//! Dropping the connection aborts both tasks.

use std::borrow::Cow;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::GatewayMessage;
use crate::session::{spawn_heartbeat, HeartbeatExit, HeartbeatState, SequenceTracker};
use crate::transport::{Inflater, Outbound};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Channel buffer size for outgoing frames
const OUTBOUND_BUFFER_SIZE: usize = 100;

/// How long a graceful close waits for the writer to flush
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Close code used when the socket ends without a close frame
const ABNORMAL_CLOSURE: u16 = 1006;

pub(crate) struct Connection {
    stream: SplitStream<WsStream>,
    outbound: mpsc::Sender<Outbound>,
    writer: JoinHandle<()>,
    heartbeat: Option<JoinHandle<HeartbeatExit>>,
    heartbeat_state: HeartbeatState,
    inflater: Inflater,
}

impl Connection {
    /// Open the socket and start the writer task
    pub async fn open(url: &str) -> GatewayResult<Self> {
        let (socket, _response) = connect_async(url).await?;
        let (sink, stream) = socket.split();
        let (outbound, rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let writer = tokio::spawn(write_loop(sink, rx));

        Ok(Self {
            stream,
            outbound,
            writer,
            heartbeat: None,
            heartbeat_state: HeartbeatState::new(),
            inflater: Inflater::new(),
        })
    }

    /// Next complete gateway frame.
    ///
    /// `Ok(None)` means the message carried nothing to act on: a partial zlib chunk,
    /// a ping, or a malformed frame that was logged and dropped. A heartbeat task
    /// that stops on its own ends the connection.
    pub async fn recv(&mut self) -> GatewayResult<Option<GatewayMessage>> {
        let message = tokio::select! {
            message = self.stream.next() => message,
            exit = wait_heartbeat(&mut self.heartbeat) => {
                return Err(match exit {
                    HeartbeatExit::Zombie => GatewayError::ZombieConnection,
                    HeartbeatExit::ChannelClosed => tungstenite::Error::ConnectionClosed.into(),
                });
            }
        };

        match message {
            Some(message) => self.decode(message?),
            None => Err(GatewayError::Closed {
                code: ABNORMAL_CLOSURE,
                reason: "stream ended without a close frame".to_string(),
            }),
        }
    }

    fn decode(&mut self, message: Message) -> GatewayResult<Option<GatewayMessage>> {
        let parsed = match message {
            Message::Binary(chunk) => match self.inflater.push(&chunk)? {
                Some(payload) => GatewayMessage::from_slice(&payload),
                None => return Ok(None),
            },
            Message::Text(text) => GatewayMessage::from_json(&text),
            Message::Close(frame) => {
                let (code, reason) = frame.map_or((1005, String::new()), |f| {
                    (u16::from(f.code), f.reason.into_owned())
                });
                tracing::info!(code, reason = %reason, "Gateway closed the connection");
                return Err(GatewayError::from_close(code, reason));
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => return Ok(None),
        };

        match parsed {
            Ok(frame) if !frame.op.is_server_op() => {
                tracing::warn!(op = %frame.op, "Dropping frame with a client-only opcode");
                Ok(None)
            }
            Ok(frame) => Ok(Some(frame)),
            Err(err) => {
                tracing::warn!(error = %err, "Dropping malformed frame");
                Ok(None)
            }
        }
    }

    /// Queue a frame for the writer
    pub async fn send(&self, frame: GatewayMessage) -> GatewayResult<()> {
        tracing::trace!(op = %frame.op, "Queueing frame");
        self.outbound
            .send(Outbound::Frame(frame))
            .await
            .map_err(|_| GatewayError::from(tungstenite::Error::ConnectionClosed))
    }

    /// Start (or restart) heartbeating at `interval`
    pub fn start_heartbeat(&mut self, interval: Duration, sequence: SequenceTracker) {
        if let Some(previous) = self.heartbeat.take() {
            previous.abort();
        }
        self.heartbeat_state = HeartbeatState::new();
        self.heartbeat = Some(spawn_heartbeat(
            interval,
            sequence,
            self.heartbeat_state.clone(),
            self.outbound.clone(),
        ));
    }

    pub fn ack_heartbeat(&self) {
        self.heartbeat_state.ack();
    }

    pub fn latency(&self) -> Option<Duration> {
        self.heartbeat_state.latency()
    }

    /// Send a close frame and wait briefly for the writer to finish
    pub async fn close(&mut self, code: u16) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
        if self.outbound.send(Outbound::Close(code)).await.is_err() {
            return;
        }
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut self.writer)
            .await
            .is_err()
        {
            tracing::debug!("Writer did not finish before the close timeout");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
        self.writer.abort();
    }
}

/// Resolves when the heartbeat task stops; pending until Hello starts one
async fn wait_heartbeat(task: &mut Option<JoinHandle<HeartbeatExit>>) -> HeartbeatExit {
    match task.as_mut() {
        Some(handle) => handle.await.unwrap_or(HeartbeatExit::ChannelClosed),
        None => std::future::pending().await,
    }
}

/// Forward queued frames to the socket until the queue closes or a close is requested
async fn write_loop(mut sink: SplitSink<WsStream, Message>, mut rx: mpsc::Receiver<Outbound>) {
    while let Some(item) = rx.recv().await {
        let message = match item {
            Outbound::Frame(frame) => match frame.to_json() {
                Ok(json) => Message::Text(json),
                Err(err) => {
                    tracing::warn!(op = %frame.op, error = %err, "Failed to encode frame");
                    continue;
                }
            },
            Outbound::Close(code) => {
                let close = CloseFrame {
                    code: WsCloseCode::from(code),
                    reason: Cow::Borrowed(""),
                };
                if let Err(err) = sink.send(Message::Close(Some(close))).await {
                    tracing::debug!(error = %err, "Failed to send close frame");
                }
                break;
            }
        };

        if let Err(err) = sink.send(message).await {
            tracing::warn!(error = %err, "Failed to write to gateway");
            break;
        }
    }

    let _ = sink.close().await;
}
