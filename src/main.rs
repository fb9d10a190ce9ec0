// vision-relay - resize images and forward them to a vision chat completion API
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};
use vision_relay::cli::Args;
use vision_relay::config::AppConfig;
use vision_relay::openai::VisionClient;
use vision_relay::server::create_router;
use vision_relay::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration, CLI flags last
    let mut config = AppConfig::load()?;
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging, config.server.debug)?;
    info!("Starting vision-relay v{}", env!("CARGO_PKG_VERSION"));

    if config.upstream.api_key.is_none() {
        warn!("OPENAI_API_KEY not configured; /analyze-image will return 500");
    }

    // Phase 3: Build upstream client
    let client = VisionClient::new(&config.upstream)?;
    info!(
        "Upstream: {} (model {}, timeout {}s)",
        client.endpoint(),
        config.upstream.model,
        config.upstream.timeout_seconds
    );

    // Phase 4: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(config, client)?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 5: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
