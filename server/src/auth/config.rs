/// Settings for validating session tokens from the external user service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the user service.
    pub jwt_secret: String,
    /// Lifetime of tokens minted by the dev/test helper.
    pub session_expiry_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "justease-dev-secret-change-me".into(),
            session_expiry_hours: 720,
        }
    }
}
