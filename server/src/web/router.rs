use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::app_state::AppState;
use super::rate_limit::{ConnectionLimiter, ws_rate_limit};
use super::{rest_api, ws_handler};

/// Build the axum router with the WebSocket and REST routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Restrict CORS to the configured origin; allow any for local dev.
    let cors = match &state.public_origin {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("https://localhost"));
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let limiters = Arc::new(ConnectionLimiter::default());

    // WebSocket — connection rate limit. The trailing-slash variant matches
    // the path the original web client dials.
    let ws_routes = Router::new()
        .route("/ws/chat/{room}", axum::routing::get(ws_handler::ws_upgrade))
        .route("/ws/chat/{room}/", axum::routing::get(ws_handler::ws_upgrade))
        .layer(axum::middleware::from_fn(ws_rate_limit));

    let api_routes = Router::new()
        .route("/api/health", axum::routing::get(rest_api::health))
        .route("/api/rooms", axum::routing::get(rest_api::list_rooms))
        .route(
            "/api/rooms/{room}/members",
            axum::routing::get(rest_api::room_members),
        );

    Router::new()
        .merge(ws_routes)
        .merge(api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Inject the connection limiter into all request extensions
        .layer(axum::Extension(limiters))
        .with_state(state)
}
