//! Pylon Hub Server
//!
//! A standalone relay hub that accepts WebSocket connections and routes
//! frames between the device and its viewers.

use anyhow::{Context, Result};
use clap::Parser;
use pylon_core::DEFAULT_WS_PORT;
use pylon_hub::{Hub, HubConfig};
use pylon_transport::WebSocketServer;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pylon-hub")]
#[command(about = "Pylon relay hub server")]
#[command(version)]
struct Cli {
    /// Listen address (default 0.0.0.0:8000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Server name used in logs
    #[arg(short, long)]
    name: Option<String>,

    /// Config file path (TOML); flags take precedence over the file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Suppress the "device offline" broadcast when the device drops
    #[arg(long)]
    quiet_offline: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    listen: Option<SocketAddr>,
    name: Option<String>,
    notify_device_offline: Option<bool>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_WS_PORT))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let listen = cli.listen.or(file.listen).unwrap_or_else(default_listen);
    let name = cli
        .name
        .or(file.name)
        .unwrap_or_else(|| "Pylon Hub".to_string());
    let notify_device_offline = if cli.quiet_offline {
        false
    } else {
        file.notify_device_offline.unwrap_or(true)
    };

    let hub = Arc::new(Hub::new(HubConfig {
        name: name.clone(),
        notify_device_offline,
    }));

    tracing::info!("starting {}", name);

    let server = WebSocketServer::bind(&listen.to_string())
        .await
        .with_context(|| format!("binding {}", listen))?;

    let serving = hub.clone();
    let serve_task = tokio::spawn(async move { serving.serve_on(server).await });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    tracing::info!(
        "shutting down, closing {} connection(s)",
        hub.connection_count()
    );
    hub.shutdown().await;
    serve_task.abort();

    Ok(())
}
