use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::engine::events::ChatFrame;

use super::app_state::AppState;
use super::auth_middleware::AuthUser;

/// Heartbeat interval: the relay sends a Ping every 30 seconds.
/// If 2 consecutive intervals pass with no Pong or inbound frame (~60s),
/// the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// `GET /ws/chat/{room}` — authenticate, then upgrade to a WebSocket bound
/// to that room. A missing or invalid token is rejected with 401 before any
/// upgrade happens, so unauthenticated clients never reach the registry.
pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    user: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room, user))
}

/// Drive one admitted connection until either direction ends.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, room: String, user: AuthUser) {
    let (session_id, mut outbound_rx) = match state.relay.connect(&room, &user.display_name) {
        Ok(admitted) => admitted,
        Err(e) => {
            warn!(%room, error = %e, "session rejected at admit");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    info!(%session_id, %room, identity = %user.display_name, "websocket connected");

    let (mut sender, mut receiver) = socket.split();

    // Any inbound traffic counts as liveness, not just Pong frames.
    let pong_seen = Arc::new(AtomicBool::new(true));

    // Forward task: drain the session's outbound queue to the socket and
    // keep the heartbeat going.
    let pong_flag = pong_seen.clone();
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await; // the first tick completes immediately
        let mut missed: u8 = 0;

        loop {
            tokio::select! {
                frame = outbound_rx.recv() => {
                    let Some(frame) = frame else { break };
                    let Ok(json) = serde_json::to_string(&frame) else { continue };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag.swap(false, Ordering::Relaxed) {
                        missed = 0;
                    } else {
                        missed += 1;
                        if missed >= 2 {
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read loop: parse inbound frames and hand them to the broadcaster. The
    // client-supplied username field is ignored — the session identity was
    // bound from the verified token at admit time.
    let relay = state.relay.clone();
    let pong_flag = pong_seen.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    pong_flag.store(true, Ordering::Relaxed);
                    match serde_json::from_str::<ChatFrame>(text.as_str()) {
                        Ok(frame) => {
                            if let Err(e) = relay.broadcast(session_id, &frame.message) {
                                debug!(%session_id, error = %e, "frame not relayed");
                            }
                        }
                        Err(e) => debug!(%session_id, error = %e, "unparseable frame"),
                    }
                }
                Message::Pong(_) => pong_flag.store(true, Ordering::Relaxed),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Whichever direction finishes first tears the whole session down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.relay.disconnect(session_id);
    info!(%session_id, %room, "websocket closed");
}
