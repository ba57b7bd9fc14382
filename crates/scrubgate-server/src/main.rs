//! Scrubgate Server - PII masking service
//!
//! Loads configuration from a YAML or TOML file plus `SCRUBGATE_*` environment
//! overrides, validates it, and serves `/mask`, `/health` and `/metrics`.

mod app;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::ServerConfig;
use scrubgate_observability::init_logging;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// How often idle rate-limit state is swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Scrubgate Server - PII detection and masking over HTTP
#[derive(Parser)]
#[command(name = "scrubgate-server")]
#[command(about = "HTTP service that detects and masks personal data in text", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "SCRUBGATE_CONFIG")]
    config: Option<String>,

    /// Host to bind (overrides config and environment)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config and environment)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    config.merge_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {:#}", e);
        return Err(e);
    }

    info!("Starting Scrubgate server");
    if let Some(path) = &cli.config {
        info!("  Config file: {}", path);
    }
    info!("  Languages: {}", config.language.supported.join(", "));
    info!("  Default masking mode: {}", config.masking.mode.as_str());
    info!(
        "  Authentication: {}",
        if config.security.auth.enabled { "enabled" } else { "disabled" }
    );
    if config.trust_proxy_headers {
        info!(
            proxies = ?config.trusted_proxies,
            "  Trusting forwarding headers from listed proxies"
        );
    }

    let app = app::build(&config)?;
    let sweeper = app::spawn_sweeper(app.guard.clone(), app.metrics.clone(), SWEEP_INTERVAL);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("  POST /mask");
    info!("  GET  /health");
    info!("  GET  /metrics");

    axum::serve(
        listener,
        app.router
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
