//! The reconnection controller: owns one live room connection, keeps the UI
//! informed of connection state, and re-dials with bounded exponential
//! backoff when the transport drops.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use crate::auth::AuthSession;
use crate::backoff::Backoff;

/// Give up on a single connection attempt after this long.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reconnection backoff: 500ms doubling to a 30s cap, until `stop()`.
const BACKOFF_BASE: Duration = Duration::from_millis(500);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Outgoing frames queued between `send` and the socket writer.
const OUTGOING_QUEUE: usize = 256;

/// Events queued for the UI layer.
const EVENT_QUEUE: usize = 256;

/// Connection state, as surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Events emitted by the room client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Connection established; the send affordance may be enabled.
    Connected,
    /// Connection lost; the send affordance must be disabled. A reconnect
    /// attempt is already scheduled.
    Disconnected,
    /// The relay rejected the stored token. Not retried — the caller should
    /// redirect to login.
    AuthRequired,
    /// A chat message arrived. `received_at` is stamped by this client at
    /// arrival; the relay has no authoritative clock.
    Message {
        username: String,
        body: String,
        received_at: DateTime<Utc>,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no stored session token; log in before joining a room")]
    MissingToken,
    #[error("client already started")]
    AlreadyStarted,
}

/// Wire frame: UTF-8 JSON with exactly these fields, no discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFrame {
    message: String,
    #[serde(default)]
    username: String,
}

/// One client's connection to a single room.
///
/// Created per open chat view; `start` spawns the connection supervisor,
/// `stop` tears it down from any state.
pub struct RoomClient {
    server_url: String,
    room: String,
    auth: AuthSession,
    identity: String,

    state: Arc<RwLock<ConnectionState>>,

    event_tx: mpsc::Sender<ClientEvent>,
    event_rx: Option<mpsc::Receiver<ClientEvent>>,

    outgoing_tx: mpsc::Sender<String>,
    outgoing_rx: Option<mpsc::Receiver<String>>,

    stop_tx: watch::Sender<bool>,
}

impl RoomClient {
    /// Create a client for `room` against `server_url`
    /// (e.g. `ws://localhost:8000`). Nothing connects until `start`.
    pub fn new(server_url: impl Into<String>, room: impl Into<String>, auth: AuthSession) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
        let (outgoing_tx, outgoing_rx) = mpsc::channel(OUTGOING_QUEUE);
        let (stop_tx, _) = watch::channel(false);
        let identity = auth.display_name();

        Self {
            server_url: server_url.into(),
            room: room.into(),
            auth,
            identity,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            event_tx,
            event_rx: Some(event_rx),
            outgoing_tx,
            outgoing_rx: Some(outgoing_rx),
            stop_tx,
        }
    }

    /// Take the event receiver (can only be called once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<ClientEvent>> {
        self.event_rx.take()
    }

    /// Begin connecting. Fails fast with `MissingToken` when no token is
    /// stored — the caller should redirect to login rather than ever dialing
    /// unauthenticated. Otherwise spawns the supervisor, which keeps the
    /// connection alive until `stop`.
    pub fn start(&mut self) -> Result<(), ClientError> {
        if !self.auth.has_token() {
            return Err(ClientError::MissingToken);
        }
        let Some(outgoing_rx) = self.outgoing_rx.take() else {
            return Err(ClientError::AlreadyStarted);
        };

        let url = format!(
            "{}/ws/chat/{}?token={}",
            self.server_url.trim_end_matches('/'),
            self.room,
            self.auth.token.trim(),
        );

        tokio::spawn(run_supervisor(
            url,
            self.state.clone(),
            self.event_tx.clone(),
            outgoing_rx,
            self.stop_tx.subscribe(),
        ));

        Ok(())
    }

    /// Send a message body. Returns false — a silent local no-op, never an
    /// error — when the body trims to empty or the connection is not live.
    /// Nothing is queued for later: messages sent while disconnected are lost
    /// by design.
    pub async fn send(&self, body: &str) -> bool {
        let body = body.trim();
        if body.is_empty() {
            return false;
        }
        if *self.state.read().await != ConnectionState::Connected {
            return false;
        }

        let frame = WireFrame {
            message: body.to_string(),
            username: self.identity.clone(),
        };
        match serde_json::to_string(&frame) {
            Ok(json) => self.outgoing_tx.try_send(json).is_ok(),
            Err(_) => false,
        }
    }

    /// Tear down from any state. Idempotent; always lands in `Disconnected`.
    pub async fn stop(&self) {
        // send_replace also records the stop when no supervisor is listening
        // yet, so a stop-then-start sequence stays stopped.
        self.stop_tx.send_replace(true);
        *self.state.write().await = ConnectionState::Disconnected;
    }

    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Display name stamped on outgoing frames (the relay re-stamps from the
    /// verified token regardless).
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn room(&self) -> &str {
        &self.room
    }
}

/// Dial, drive, re-dial: the connection supervisor.
async fn run_supervisor(
    url: String,
    state: Arc<RwLock<ConnectionState>>,
    event_tx: mpsc::Sender<ClientEvent>,
    mut outgoing_rx: mpsc::Receiver<String>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::new(BACKOFF_BASE, BACKOFF_CAP);
    let mut first_attempt = true;

    loop {
        if *stop_rx.borrow() {
            break;
        }

        *state.write().await = if first_attempt {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        };
        first_attempt = false;

        match timeout(CONNECT_TIMEOUT, connect_async(url.as_str())).await {
            Ok(Ok((ws, _response))) => {
                backoff.reset();
                *state.write().await = ConnectionState::Connected;
                let _ = event_tx.send(ClientEvent::Connected).await;

                drive_session(ws, &event_tx, &mut outgoing_rx, &mut stop_rx).await;

                *state.write().await = ConnectionState::Disconnected;
                let _ = event_tx.send(ClientEvent::Disconnected).await;

                // Anything queued while the link dropped is best-effort: discard
                // rather than replay.
                while outgoing_rx.try_recv().is_ok() {}
            }
            Ok(Err(e)) => {
                if is_auth_rejection(&e) {
                    warn!("relay rejected session token");
                    *state.write().await = ConnectionState::Disconnected;
                    let _ = event_tx.send(ClientEvent::AuthRequired).await;
                    return;
                }
                debug!(error = %e, "connect attempt failed");
            }
            Err(_) => debug!("connect attempt timed out"),
        }

        if *stop_rx.borrow() {
            break;
        }
        let delay = backoff.next_delay();
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    *state.write().await = ConnectionState::Disconnected;
}

/// Pump one live connection until it drops or `stop` fires.
async fn drive_session(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    event_tx: &mpsc::Sender<ClientEvent>,
    outgoing_rx: &mut mpsc::Receiver<String>,
    stop_rx: &mut watch::Receiver<bool>,
) {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            json = outgoing_rx.recv() => {
                let Some(json) = json else { break };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WireFrame>(text.as_str()) {
                            Ok(frame) => {
                                let _ = event_tx.send(ClientEvent::Message {
                                    username: frame.username,
                                    body: frame.message,
                                    received_at: Utc::now(),
                                }).await;
                            }
                            Err(e) => debug!(error = %e, "unparseable frame"),
                        }
                    }
                    // tungstenite queues the pong reply itself
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                }
            }
        }
    }
}

/// HTTP 401 during the upgrade means our token was rejected, which retrying
/// cannot fix.
fn is_auth_rejection(err: &tungstenite::Error) -> bool {
    matches!(
        err,
        tungstenite::Error::Http(response)
            if response.status() == tungstenite::http::StatusCode::UNAUTHORIZED
    )
}
