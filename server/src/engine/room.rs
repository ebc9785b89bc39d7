use std::collections::HashSet;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::events::SessionId;

/// In-memory state for a single room.
#[derive(Debug)]
pub struct RoomState {
    pub name: String,
    /// Session IDs of currently connected members.
    pub members: HashSet<SessionId>,
    pub created_at: DateTime<Utc>,
}

impl RoomState {
    fn new(name: String) -> Self {
        Self {
            name,
            members: HashSet::new(),
            created_at: Utc::now(),
        }
    }
}

/// Tracks which sessions belong to which room.
///
/// Rooms are created implicitly on first admit and dropped when their last
/// member leaves. Nothing is persisted — a relay restart starts from zero.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, RoomState>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Add a session to a room, creating the room if it does not exist yet.
    /// Idempotent: admitting an already-present session is a no-op.
    pub fn admit(&self, room: &str, session_id: SessionId) {
        self.rooms
            .entry(room.to_string())
            .or_insert_with(|| RoomState::new(room.to_string()))
            .members
            .insert(session_id);
    }

    /// Remove a session from a room. Idempotent. Empty rooms are
    /// garbage-collected from the map.
    pub fn remove(&self, room: &str, session_id: SessionId) {
        if let Some(mut state) = self.rooms.get_mut(room) {
            state.members.remove(&session_id);
        }
        self.rooms.remove_if(room, |_, state| state.members.is_empty());
    }

    /// Point-in-time snapshot of a room's member sessions. The caller can
    /// iterate the snapshot while concurrent admits/removes proceed.
    pub fn members_of(&self, room: &str) -> Vec<SessionId> {
        self.rooms
            .get(room)
            .map(|state| state.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of sessions currently in a room.
    pub fn occupancy(&self, room: &str) -> usize {
        self.rooms.get(room).map(|state| state.members.len()).unwrap_or(0)
    }

    /// Names of all rooms with at least one member.
    pub fn active_rooms(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
