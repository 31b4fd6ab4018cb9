// src/core/tasks/monitor.rs

//! Periodic one-line summary of server activity.

use crate::core::state::ServerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

const STATS_INTERVAL: Duration = Duration::from_secs(5);

pub struct StatsMonitor {
    state: Arc<ServerState>,
}

impl StatsMonitor {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(STATS_INTERVAL);
        interval.tick().await;
        let mut last_commands = self.state.stats.get_total_commands();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let total = self.state.stats.get_total_commands();
                    let ops = total.saturating_sub(last_commands);
                    last_commands = total;
                    let clients = self.state.stats.connected_clients();
                    // Quiet servers stay quiet in the log.
                    if ops == 0 && clients == 0 {
                        continue;
                    }
                    let keys: usize = (0..self.state.keyspace.db_count())
                        .map(|db| self.state.keyspace.dbsize(db))
                        .sum();
                    info!(
                        "Clients: {}, Keys: {}, Ops/sec: {:.1}, Used memory: {} bytes",
                        clients,
                        keys,
                        ops as f64 / STATS_INTERVAL.as_secs_f64(),
                        self.state.keyspace.used_memory()
                    );
                }
                _ = shutdown_rx.recv() => return,
            }
        }
    }
}
