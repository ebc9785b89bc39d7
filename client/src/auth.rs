use serde::{Deserialize, Serialize};

/// User record persisted client-side by the external login flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

/// Bearer token plus user record, as stored by the login flow. The chat
/// client never mints or refreshes tokens — it only reads what the auth
/// collaborator left behind.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    pub token: String,
    pub user: Option<UserRecord>,
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    pub fn with_user(token: impl Into<String>, user: UserRecord) -> Self {
        Self {
            token: token.into(),
            user: Some(user),
        }
    }

    /// Whether a usable token is stored. Without one the client must signal
    /// redirect-to-login instead of attempting a connection.
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Display name shown on outgoing messages: the user's first name, or
    /// "User" when the record is missing or blank.
    pub fn display_name(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.first_name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "User".to_string())
    }
}
