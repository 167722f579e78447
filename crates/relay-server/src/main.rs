//! Relay server - real-time WebSocket chat fan-out.

use anyhow::Result;
use clap::Parser;
use relay_server::{config::Config, logging, routes, state::AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use logging::{LogArgs, LogConfig};

/// Relay server - broadcasts chat messages to every connected browser.
#[derive(Parser, Debug)]
#[command(name = "relay-server")]
#[command(about = "WebSocket fan-out relay for browser chat clients")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override bind address from config
    #[arg(long)]
    host: Option<String>,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogConfig::from(&cli.log));

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    tracing::info!(
        target: "relay::startup",
        "Loaded configuration (port: {}, write timeout: {:?}, prune on disconnect: {})",
        config.port,
        config.write_timeout(),
        config.prune_on_disconnect
    );

    let (state, dispatcher) = AppState::new(config.clone());
    dispatcher.spawn();
    tracing::info!(target: "relay::startup", "Started dispatch loop");

    let app = routes::build_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "relay::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
