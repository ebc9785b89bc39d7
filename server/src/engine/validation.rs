/// Maximum message body length (bytes).
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Maximum room name length.
pub const MAX_ROOM_NAME_LENGTH: usize = 64;

/// Maximum identity (display name) length.
pub const MAX_IDENTITY_LENGTH: usize = 64;

/// Validate a room name. Must be 1-64 chars with no whitespace or slashes
/// (room names appear in the WebSocket path).
pub fn validate_room_name(room: &str) -> Result<(), String> {
    if room.is_empty() {
        return Err("Room name cannot be empty".into());
    }
    if room.len() > MAX_ROOM_NAME_LENGTH {
        return Err(format!(
            "Room name too long (max {} characters)",
            MAX_ROOM_NAME_LENGTH
        ));
    }
    if room.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err("Room name cannot contain whitespace or slashes".into());
    }
    Ok(())
}

/// Validate a display identity. Must be non-blank and within the length limit.
pub fn validate_identity(identity: &str) -> Result<(), String> {
    if identity.trim().is_empty() {
        return Err("Identity cannot be blank".into());
    }
    if identity.len() > MAX_IDENTITY_LENGTH {
        return Err(format!(
            "Identity too long (max {} characters)",
            MAX_IDENTITY_LENGTH
        ));
    }
    Ok(())
}

/// Validate message content. Must be non-empty after trimming and under the
/// length limit.
pub fn validate_message(content: &str, max_length: usize) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Message cannot be empty".into());
    }
    if content.len() > max_length {
        return Err(format!("Message too long (max {} characters)", max_length));
    }
    Ok(())
}
