// src/core/tasks/persistence.rs

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::core::persistence::spawn_rewrite;
use crate::core::state::ServerState;

/// The interval for the AOF rewrite manager to check conditions.
const AOF_REWRITE_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Whether a log of `current_size` bytes is due for an automatic rewrite.
///
/// `last_size` is the size right after the previous rewrite, or at startup.
pub fn rewrite_due(current_size: u64, last_size: u64, min_size: u64, percentage: u64) -> bool {
    if percentage == 0 || current_size < min_size {
        return false;
    }
    if last_size == 0 {
        return true;
    }
    let growth = current_size.saturating_sub(last_size) * 100 / last_size;
    growth >= percentage
}

/// A task that periodically checks if an AOF rewrite should be triggered
/// based on the file size growth.
pub struct AofRewriteManager {
    state: Arc<ServerState>,
}

impl AofRewriteManager {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Runs the main loop for the AOF rewrite manager.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let persistence = &self.state.config.persistence;
        if !persistence.aof_enabled || persistence.auto_aof_rewrite_percentage == 0 {
            info!("AOF auto-rewrite is disabled. Manager task will not run.");
            return;
        }

        if let Ok(metadata) = tokio::fs::metadata(&persistence.aof_path).await {
            self.state
                .persistence
                .aof_last_rewrite_size
                .store(metadata.len(), Ordering::Relaxed);
        }

        info!(
            "AOF auto-rewrite manager started. Min size: {} bytes, Percentage: {}%",
            persistence.auto_aof_rewrite_min_size, persistence.auto_aof_rewrite_percentage
        );
        let mut interval = tokio::time::interval(AOF_REWRITE_CHECK_INTERVAL);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.check_and_trigger_rewrite().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("AOF auto-rewrite manager shutting down.");
                    return;
                }
            }
        }
    }

    /// Checks the AOF size and triggers a rewrite if conditions are met.
    async fn check_and_trigger_rewrite(&self) {
        if self.state.persistence.is_rewriting() {
            return;
        }
        let persistence = &self.state.config.persistence;
        let current_size = match tokio::fs::metadata(&persistence.aof_path).await {
            Ok(metadata) => metadata.len(),
            Err(_) => return,
        };
        let last_size = self
            .state
            .persistence
            .aof_last_rewrite_size
            .load(Ordering::Relaxed);

        if rewrite_due(
            current_size,
            last_size,
            persistence.auto_aof_rewrite_min_size,
            persistence.auto_aof_rewrite_percentage,
        ) {
            info!(
                "AOF rewrite condition met. Current size: {}, Last size: {} (Threshold: {}%)",
                current_size, last_size, persistence.auto_aof_rewrite_percentage
            );
            if let Err(e) = spawn_rewrite(&self.state) {
                warn!("Automatic AOF rewrite not started: {}", e);
            }
        }
    }
}
