// src/server/spawner.rs

//! Spawns all of the server's long-running background tasks.

use super::context::ServerContext;
use crate::core::persistence::AofWriterTask;
use crate::core::storage::ttl::TtlManager;
use crate::core::tasks::{monitor::StatsMonitor, persistence::AofRewriteManager};
use anyhow::{Context, Result};
use tracing::info;

/// Spawns all background tasks into the context's JoinSet.
pub async fn spawn_all(ctx: &mut ServerContext) -> Result<()> {
    let server_state = &ctx.state;
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Core Maintenance Tasks ---
    let ttl_manager = TtlManager::new(server_state.clone());
    let shutdown_rx_ttl = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        ttl_manager.run(shutdown_rx_ttl).await;
        Ok(())
    });

    let monitor = StatsMonitor::new(server_state.clone());
    let shutdown_rx_monitor = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        monitor.run(shutdown_rx_monitor).await;
        Ok(())
    });

    // --- Persistence Tasks ---
    if let Some(aof_rx) = ctx.aof_rx.take() {
        // Opening the log for append is the one fatal persistence error.
        let writer = AofWriterTask::new(server_state.clone(), aof_rx)
            .await
            .context("Failed to open the append only file for writing")?;
        background_tasks.spawn(async move {
            writer.run().await?;
            Ok(())
        });

        let aof_rewrite_manager = AofRewriteManager::new(server_state.clone());
        let shutdown_rx_aof_manager = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            aof_rewrite_manager.run(shutdown_rx_aof_manager).await;
            Ok(())
        });
    }

    info!("All background tasks have been spawned.");
    Ok(())
}
