use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use justease_server::config::ServerConfig;
use justease_server::engine::relay::ChatRelay;
use justease_server::web::app_state::AppState;
use justease_server::web::router::build_router;

#[derive(Parser)]
#[command(name = "justease-server", about = "JustEase chat relay")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "justease.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(&cli.config);

    let relay = Arc::new(ChatRelay::new(config.limits.max_message_length));

    let state = Arc::new(AppState {
        relay,
        auth_config: config.to_auth_config(),
        public_origin: config.server.public_origin.clone(),
    });

    let app = build_router(state);

    info!("JustEase relay listening on {}", config.server.bind_address);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;

    // ConnectInfo gives the rate limiter real peer addresses.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
