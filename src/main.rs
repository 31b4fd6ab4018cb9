// src/main.rs

//! The main entry point for the Carade server application.

use anyhow::{Context, Result, anyhow};
use carade::config::Config;
use carade::server;
use std::env;
use tracing::error;
use tracing_subscriber::{filter::EnvFilter, prelude::*, reload};

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARADE_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--version") {
        println!("Carade version {VERSION}");
        return Ok(());
    }

    // It can be provided via a --config flag; otherwise, it defaults to "config.toml".
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
        .unwrap_or("config.toml");

    let mut config = Config::load(config_path)
        .with_context(|| format!("Failed to load configuration from \"{config_path}\""))?;

    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        let port_str = args
            .get(port_index + 1)
            .ok_or_else(|| anyhow!("--port flag requires a value"))?;
        config.port = port_str
            .parse::<u16>()
            .map_err(|_| anyhow!("Invalid port number: {port_str}"))?;
    }

    // RUST_LOG wins over the configured level.
    let initial_log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    let (filter, _reload_handle) = reload::Layer::new(EnvFilter::new(initial_log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true),
        )
        .init();

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {}", e);
        return Err(e);
    }
    Ok(())
}
