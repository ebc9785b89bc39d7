use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use super::events::{ChatFrame, SessionId};
use super::rate_limiter::RateLimiter;
use super::room::RoomRegistry;
use super::session::{ChatSession, MAX_OUTBOUND_QUEUE};
use super::validation;

/// Message rate limit per identity: burst of 10, refill 1 per second.
const MESSAGE_BURST: u32 = 10;
const MESSAGE_REFILL: Duration = Duration::from_secs(1);

/// The central hub that manages all relay state. Transport-agnostic — the
/// WebSocket adapter calls into this, and tests drive it directly.
pub struct ChatRelay {
    /// All currently connected sessions, keyed by session ID.
    sessions: DashMap<SessionId, Arc<ChatSession>>,
    /// Room membership.
    rooms: RoomRegistry,
    /// Per-identity message rate limiter.
    message_limiter: RateLimiter,
    /// Maximum accepted message body length (bytes).
    max_message_length: usize,
}

impl ChatRelay {
    pub fn new(max_message_length: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            rooms: RoomRegistry::new(),
            message_limiter: RateLimiter::new(MESSAGE_BURST, MESSAGE_REFILL),
            max_message_length,
        }
    }

    // ── Session lifecycle ───────────────────────────────────────────

    /// Admit a new session into a room. The identity must already be bound
    /// from the verified auth token — the relay never reads it off the wire.
    /// Returns the session ID and the receiver feeding the connection's
    /// write loop.
    pub fn connect(
        &self,
        room: &str,
        identity: &str,
    ) -> Result<(SessionId, mpsc::Receiver<ChatFrame>), String> {
        validation::validate_room_name(room)?;
        validation::validate_identity(identity)?;

        let session_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(MAX_OUTBOUND_QUEUE);

        let session = Arc::new(ChatSession::new(
            session_id,
            room.to_string(),
            identity.to_string(),
            tx,
        ));

        self.sessions.insert(session_id, session);
        self.rooms.admit(room, session_id);

        info!(%session_id, %room, %identity, "session connected");
        Ok((session_id, rx))
    }

    /// Remove a session and its room membership. Idempotent: disconnecting a
    /// session that is already gone is a no-op.
    pub fn disconnect(&self, session_id: SessionId) {
        let Some((_, session)) = self.sessions.remove(&session_id) else {
            return;
        };

        self.rooms.remove(&session.room, session_id);
        info!(%session_id, room = %session.room, identity = %session.identity, "session disconnected");
    }

    // ── Fan-out ─────────────────────────────────────────────────────

    /// Relay a message from one session to every member of its room,
    /// including the sender (clients recognize their own echo by username).
    ///
    /// Membership is snapshotted at the instant of the call; a session that
    /// joins mid-broadcast may miss this message but sees every later one.
    /// Frames from one sender reach each recipient in send order because the
    /// sender's connection task calls this serially and each recipient queue
    /// is FIFO.
    pub fn broadcast(&self, sender_id: SessionId, body: &str) -> Result<(), String> {
        validation::validate_message(body, self.max_message_length)?;

        let session = self
            .sessions
            .get(&sender_id)
            .ok_or("Session not found")?
            .clone();

        if !self.message_limiter.allow(&session.identity) {
            return Err("Rate limit exceeded. Please slow down.".into());
        }

        let frame = ChatFrame::new(session.identity.clone(), body.trim());

        for member_id in self.rooms.members_of(&session.room) {
            if let Some(member) = self.sessions.get(&member_id)
                && !member.send(frame.clone())
            {
                warn!(%member_id, room = %session.room, "dropped frame for slow or closed session");
            }
        }

        Ok(())
    }

    // ── Introspection (REST surface) ────────────────────────────────

    /// Display names of the sessions currently in a room.
    pub fn members(&self, room: &str) -> Vec<String> {
        self.rooms
            .members_of(room)
            .into_iter()
            .filter_map(|sid| self.sessions.get(&sid).map(|s| s.identity.clone()))
            .collect()
    }

    /// Number of sessions currently in a room.
    pub fn occupancy(&self, room: &str) -> usize {
        self.rooms.occupancy(room)
    }

    /// Names of all rooms with at least one connected session.
    pub fn active_rooms(&self) -> Vec<String> {
        self.rooms.active_rooms()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Get a session by ID.
    pub fn get_session(&self, session_id: SessionId) -> Option<Arc<ChatSession>> {
        self.sessions.get(&session_id).map(|s| s.clone())
    }
}
