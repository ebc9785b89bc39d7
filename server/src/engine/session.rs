use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::events::{ChatFrame, SessionId};

/// Maximum queued outbound frames per session (prevents memory exhaustion from slow clients).
pub const MAX_OUTBOUND_QUEUE: usize = 1024;

/// A live, authenticated connection to a single room.
///
/// The room and identity are fixed for the session's lifetime; the identity
/// comes from the verified auth token, never from the client's frames.
#[derive(Debug)]
pub struct ChatSession {
    pub id: SessionId,
    /// Room this session is bound to.
    pub room: String,
    /// Display name bound at admit time from the authenticated user.
    pub identity: String,
    /// Outbound frames to this session's write loop (bounded to prevent memory exhaustion).
    outbound: mpsc::Sender<ChatFrame>,
    pub connected_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(
        id: SessionId,
        room: String,
        identity: String,
        outbound: mpsc::Sender<ChatFrame>,
    ) -> Self {
        Self {
            id,
            room,
            identity,
            outbound,
            connected_at: Utc::now(),
        }
    }

    /// Push a frame to this session. Returns false if the connection is gone
    /// or the outbound queue is full (slow client protection — the frame is
    /// dropped rather than blocking the broadcaster).
    pub fn send(&self, frame: ChatFrame) -> bool {
        self.outbound.try_send(frame).is_ok()
    }
}
