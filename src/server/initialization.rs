// src/server/initialization.rs

//! Handles the server initialization process: state setup, replaying the
//! append log and binding the listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::persistence::{AofLoader, get_temp_aof_path};
use crate::core::state::ServerState;
use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let server_init = ServerState::initialize(config)?;
    let server_state = server_init.state;
    info!("Server state initialized.");

    load_persistence_data(&server_state).await?;

    let config = &server_state.config;
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| anyhow!("Failed to bind {}:{}: {}", config.host, config.port, e))?;
    info!("Carade server listening on {}:{}", config.host, config.port);

    Ok(ServerContext {
        state: server_state.clone(),
        aof_rx: server_init.aof_rx,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    match config.maxmemory {
        Some(limit) => info!(
            "Memory limit set to {} bytes ({:.2} MB), policy {}.",
            limit,
            limit as f64 / 1024.0 / 1024.0,
            config.maxmemory_policy
        ),
        None => warn!("WARNING: No 'maxmemory' limit is active. Server memory is unbounded."),
    }
    info!("Server configured with {} databases.", config.databases);
}

/// Replays the append log, if enabled, before any client can connect.
async fn load_persistence_data(server_state: &Arc<ServerState>) -> Result<()> {
    let persistence = &server_state.config.persistence;
    if !persistence.aof_enabled {
        info!("No persistence method enabled. Starting with an empty state.");
        return Ok(());
    }

    let aof_path = Path::new(&persistence.aof_path);
    if let Some(parent) = aof_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            anyhow!(
                "Failed to create persistence directory '{}': {}",
                parent.display(),
                e
            )
        })?;
        info!("Created persistence directory: {}", parent.display());
    }

    let temp_path = get_temp_aof_path(aof_path)?;
    if temp_path.exists() {
        let msg = format!(
            "FATAL: Found leftover AOF temp file '{}' from a previous crashed rewrite. Server is exiting to prevent data loss. Please manually inspect the files and restore the correct one by renaming it to '{}'.",
            temp_path.display(),
            aof_path.display()
        );
        error!("{}", msg);
        return Err(anyhow!(msg));
    }

    AofLoader::new(persistence.clone())
        .load_into(server_state)
        .await?;
    info!("Persistence data loaded successfully.");
    Ok(())
}
