use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT claims for session tokens minted by the external user service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    /// Display name (the user's first name). May be blank.
    #[serde(default)]
    pub name: String,
    pub exp: i64, // expiry (unix timestamp)
    pub iat: i64, // issued at
}

impl Claims {
    /// Display identity bound to the session at admit time: the first name
    /// from the token, or "User" when the token carries none.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            "User".to_string()
        } else {
            name.to_string()
        }
    }
}

/// Create a session token. The relay only does this in tests and local
/// development — in production the user service mints tokens with the
/// shared secret.
pub fn create_session_token(
    user_id: &str,
    display_name: &str,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        name: display_name.to_string(),
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a session token and return the claims.
pub fn validate_session_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
