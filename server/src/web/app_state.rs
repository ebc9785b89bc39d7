use std::sync::Arc;

use crate::auth::config::AuthConfig;
use crate::engine::relay::ChatRelay;

/// Shared state for the web layer.
pub struct AppState {
    pub relay: Arc<ChatRelay>,
    pub auth_config: AuthConfig,
    /// Browser origin allowed by CORS. None allows any origin (local dev).
    pub public_origin: Option<String>,
}
