use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use crate::auth::token::validate_session_token;

use super::app_state::AppState;

/// Extractor that validates the session JWT. Use this in any handler that
/// requires authentication, including the WebSocket upgrade.
///
/// Browser WebSocket clients cannot set request headers, so the token is
/// accepted from (in order): the `Authorization: Bearer` header, a `token`
/// query parameter, or the `justease_session` cookie.
pub struct AuthUser {
    pub user_id: String,
    /// Display name bound from the verified token (first name, or "User").
    pub display_name: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "Not authenticated").into_response())?;

        let claims = validate_session_token(&token, &state.auth_config.jwt_secret).map_err(
            |_| (StatusCode::UNAUTHORIZED, "Invalid or expired session").into_response(),
        )?;

        Ok(AuthUser {
            user_id: claims.sub.clone(),
            display_name: claims.display_name(),
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn query_token(parts: &Parts) -> Option<String> {
    // Session tokens are base64url and never need percent-decoding.
    parts
        .uri
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .map(str::to_string)
        .filter(|t| !t.is_empty())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get("justease_session")
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}
