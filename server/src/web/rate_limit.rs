use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::engine::rate_limiter::RateLimiter;

/// Per-IP limiter for WebSocket connection storms:
/// burst of 5, refill 1 per 12 seconds (~5/minute).
pub struct ConnectionLimiter {
    pub ws: RateLimiter,
}

impl Default for ConnectionLimiter {
    fn default() -> Self {
        Self {
            ws: RateLimiter::new(5, Duration::from_secs(12)),
        }
    }
}

/// Extract client IP from a request, only trusting proxy headers from loopback.
///
/// When the direct peer is a loopback address the connection is coming through
/// a local reverse proxy and X-Forwarded-For / X-Real-IP can be trusted.
/// Otherwise the actual peer IP is used, so spoofed headers cannot bypass the
/// limit.
fn client_ip(req: &Request<Body>) -> String {
    let peer_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0.ip());

    if peer_ip.is_some_and(|ip| ip.is_loopback()) {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .or_else(|| req.headers().get("x-real-ip").and_then(|v| v.to_str().ok()));
        if let Some(ip) = forwarded {
            return ip.trim().to_string();
        }
    }

    peer_ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for WebSocket connection rate limiting.
pub async fn ws_rate_limit(req: Request<Body>, next: Next) -> Response {
    if let Some(limiters) = req.extensions().get::<Arc<ConnectionLimiter>>() {
        let ip = client_ip(&req);
        if !limiters.ws.allow(&ip) {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many connections. Please try again later.",
            )
                .into_response();
        }
    }
    next.run(req).await
}
