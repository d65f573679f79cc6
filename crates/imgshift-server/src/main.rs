use clap::Parser;
use tracing_subscriber::EnvFilter;

use imgshift_server::{router, ServerConfig, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(config.log_filter())
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        body_limit_mb = config.body_limit_mb,
        timeout_secs = ?config.request_timeout_secs,
        "imgshift server listening"
    );

    axum::serve(listener, router(&config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("imgshift server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
