use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::{Value, json};

use super::app_state::AppState;
use super::auth_middleware::AuthUser;

#[derive(Serialize)]
pub struct RoomSummary {
    pub room: String,
    pub occupancy: usize,
}

/// Liveness probe. No auth.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// List rooms with at least one connected session.
pub async fn list_rooms(State(state): State<Arc<AppState>>, _user: AuthUser) -> Json<Vec<RoomSummary>> {
    let mut rooms: Vec<RoomSummary> = state
        .relay
        .active_rooms()
        .into_iter()
        .map(|room| RoomSummary {
            occupancy: state.relay.occupancy(&room),
            room,
        })
        .collect();
    rooms.sort_by(|a, b| a.room.cmp(&b.room));
    Json(rooms)
}

/// Display names of the sessions currently in a room. Empty for unknown rooms
/// (an empty room and a never-seen room are indistinguishable by design).
pub async fn room_members(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(room): Path<String>,
) -> Json<Vec<String>> {
    Json(state.relay.members(&room))
}
