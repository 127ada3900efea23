//! Test helpers for integration tests
//!
//! Provides an in-process gateway that accepts client connections over a real
//! WebSocket, compresses outgoing frames as one zlib stream per connection,
//! and lets a test script the server side of the handshake.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use futures_util::{SinkExt, StreamExt};
use lemon_common::ClientConfig;
use lemon_gateway::protocol::{GatewayMessage, OpCode};
use lemon_gateway::GatewayEvent;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

/// Upper bound for any single wait in a test
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Path prefix of the resume url handed out in READY
pub const RESUME_PATH: &str = "/resume";

/// Fake gateway listening on an ephemeral local port
pub struct FakeGateway {
    addr: SocketAddr,
    connections: mpsc::Receiver<GatewayPeer>,
    _accept: JoinHandle<()>,
}

impl FakeGateway {
    /// Bind and start accepting WebSocket connections
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, connections) = mpsc::channel(8);

        let accept = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                match GatewayPeer::accept(stream).await {
                    Ok(peer) => {
                        if tx.send(peer).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => eprintln!("fake gateway handshake failed: {err}"),
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            _accept: accept,
        })
    }

    /// Base url to configure the client with
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Url handed out as `resume_gateway_url`
    pub fn resume_url(&self) -> String {
        format!("{}{RESUME_PATH}", self.url())
    }

    /// Wait for the client to open its next connection
    pub async fn next_connection(&mut self) -> Result<GatewayPeer> {
        tokio::time::timeout(WAIT_TIMEOUT, self.connections.recv())
            .await?
            .ok_or_else(|| anyhow!("fake gateway stopped accepting"))
    }
}

/// Server side of one client connection
pub struct GatewayPeer {
    socket: WebSocketStream<TcpStream>,
    encoder: ZlibEncoder<Vec<u8>>,
    /// Request path and query the client connected with
    pub path: String,
    seq: u64,
    auto_ack: bool,
}

impl GatewayPeer {
    async fn accept(stream: TcpStream) -> Result<Self> {
        let mut path = String::new();
        let socket = accept_hdr_async(stream, |req: &Request, resp: Response| {
            path = req.uri().to_string();
            Ok::<Response, ErrorResponse>(resp)
        })
        .await?;

        Ok(Self {
            socket,
            encoder: ZlibEncoder::new(Vec::new(), Compression::default()),
            path,
            seq: 0,
            auto_ack: true,
        })
    }

    /// Stop answering heartbeats, so the client sees a zombie connection
    pub fn without_heartbeat_acks(mut self) -> Self {
        self.auto_ack = false;
        self
    }

    pub fn is_resume_url(&self) -> bool {
        self.path.starts_with(RESUME_PATH)
    }

    /// Compress one frame onto the connection's zlib stream
    fn compress(&mut self, frame: &GatewayMessage) -> Result<Vec<u8>> {
        let json = frame.to_json()?;
        self.encoder.write_all(json.as_bytes())?;
        // sync flush ends the frame with 00 00 FF FF
        self.encoder.flush()?;
        Ok(std::mem::take(self.encoder.get_mut()))
    }

    /// Send a frame as a single compressed binary message
    pub async fn send(&mut self, frame: &GatewayMessage) -> Result<()> {
        self.send_chunked(frame, 1).await
    }

    /// Send a frame split over `parts` binary messages
    pub async fn send_chunked(&mut self, frame: &GatewayMessage, parts: usize) -> Result<()> {
        let bytes = self.compress(frame)?;
        let size = bytes.len().div_ceil(parts.max(1)).max(1);
        for chunk in bytes.chunks(size) {
            self.socket.send(Message::Binary(chunk.to_vec())).await?;
        }
        Ok(())
    }

    /// Send a frame as uncompressed text
    pub async fn send_text(&mut self, frame: &GatewayMessage) -> Result<()> {
        self.socket.send(Message::Text(frame.to_json()?)).await?;
        Ok(())
    }

    pub async fn hello(&mut self, interval_ms: u64) -> Result<()> {
        self.send(&GatewayMessage::hello(interval_ms)).await
    }

    /// Send a dispatch with the next sequence number
    pub async fn dispatch(&mut self, event: &str, data: Value) -> Result<u64> {
        self.dispatch_chunked(event, data, 1).await
    }

    pub async fn dispatch_chunked(&mut self, event: &str, data: Value, parts: usize) -> Result<u64> {
        self.seq += 1;
        let frame = GatewayMessage::dispatch(event, self.seq, data);
        self.send_chunked(&frame, parts).await?;
        Ok(self.seq)
    }

    /// Continue numbering after `seq`, e.g. on a resumed session
    pub fn set_sequence(&mut self, seq: u64) {
        self.seq = seq;
    }

    /// Next frame from the client that is not a heartbeat
    pub async fn recv(&mut self) -> Result<GatewayMessage> {
        loop {
            let frame = self.next_frame().await?;
            if frame.op == OpCode::Heartbeat {
                self.answer_heartbeat().await?;
                continue;
            }
            return Ok(frame);
        }
    }

    /// Sequence carried by the next heartbeat from the client
    pub async fn next_heartbeat(&mut self) -> Result<Option<u64>> {
        loop {
            let frame = self.next_frame().await?;
            if let Some(seq) = frame.as_heartbeat_seq() {
                self.answer_heartbeat().await?;
                return Ok(seq);
            }
        }
    }

    async fn answer_heartbeat(&mut self) -> Result<()> {
        if self.auto_ack {
            self.send(&GatewayMessage::heartbeat_ack()).await?;
        }
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<GatewayMessage> {
        loop {
            let message = tokio::time::timeout(WAIT_TIMEOUT, self.socket.next())
                .await?
                .ok_or_else(|| anyhow!("client dropped the connection"))??;
            match message {
                Message::Text(text) => return Ok(GatewayMessage::from_json(&text)?),
                Message::Close(frame) => bail!("client closed the connection: {frame:?}"),
                _ => continue,
            }
        }
    }

    /// Close from the server side with `code`
    pub async fn close(&mut self, code: u16) -> Result<()> {
        self.socket
            .close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: "".into(),
            }))
            .await?;
        Ok(())
    }

    /// Wait for the client's close frame and return its code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        loop {
            match tokio::time::timeout(WAIT_TIMEOUT, self.socket.next()).await? {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err.into()),
                None => bail!("stream ended without a close frame"),
            }
        }
    }
}

/// Client configuration pointed at the fake gateway, with fast reconnects
pub fn test_config(gateway_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new("token");
    config.gateway.url = gateway_url.to_string();
    config.reconnect.base_delay = Duration::from_millis(10);
    config.reconnect.max_delay = Duration::from_millis(50);
    config.reconnect.max_attempts = Some(5);
    config
}

/// Receiver of every published event name, in publish order
pub struct EventLog {
    rx: mpsc::UnboundedReceiver<String>,
}

impl EventLog {
    /// Subscribe to every event on `bus`
    pub fn attach(bus: &Arc<lemon_gateway::EventBus>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        bus.subscribe_all(move |event: Arc<GatewayEvent>| {
            let _ = tx.send(event.name().to_string());
            async {}
        });
        Self { rx }
    }

    pub async fn next(&mut self) -> Result<String> {
        tokio::time::timeout(WAIT_TIMEOUT, self.rx.recv())
            .await?
            .ok_or_else(|| anyhow!("event bus dropped"))
    }

    /// Wait for the next event named `name`, returning the names skipped on the way
    pub async fn wait_for(&mut self, name: &str) -> Result<Vec<String>> {
        let mut skipped = Vec::new();
        loop {
            let next = self.next().await?;
            if next == name {
                return Ok(skipped);
            }
            skipped.push(next);
        }
    }
}
