use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connected session (one per connection, not per user).
pub type SessionId = Uuid;

/// The wire entity exchanged over a chat room connection.
///
/// Frames are UTF-8 JSON text with exactly these fields; there is no type
/// discriminator, sequence number, or ack. Inbound frames may carry any
/// `username` the client likes — the relay ignores it and stamps outbound
/// frames with the identity bound to the session at admit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    /// Free-text message body.
    pub message: String,
    /// Sender display name. Authoritative only on outbound frames.
    #[serde(default)]
    pub username: String,
}

impl ChatFrame {
    pub fn new(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            username: username.into(),
        }
    }
}
