// src/core/storage/ttl.rs

//! Implements the active, sampling-based TTL expiration manager.

use crate::core::state::ServerState;
use crate::core::storage::context::del_args;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// The interval at which the TTL manager checks for expired keys.
const TTL_CHECK_INTERVAL: Duration = Duration::from_millis(100);
/// The number of keys to sample from each database in each cycle.
const TTL_SAMPLE_SIZE: usize = 20;
/// The percentage of expired keys in a sample above which the same
/// database is sampled again.
const TTL_EXPIRED_THRESHOLD_PERCENT: usize = 25;
/// Upper bound on resamples of one database per cycle.
const TTL_MAX_LOOPS_PER_DB: usize = 10;

/// `TtlManager` is a background task that actively expires keys so data that
/// is never read again still leaves memory.
pub struct TtlManager {
    state: Arc<ServerState>,
}

impl TtlManager {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Runs the main loop for the TTL expiration manager.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("TTL expiration manager started (active, sampling-based).");
        let mut interval = tokio::time::interval(TTL_CHECK_INTERVAL);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("TTL expiration manager shutting down.");
                    return;
                }
            }
        }
    }

    /// One pass over every database. Returns the number of keys removed.
    ///
    /// Each database is sampled; while more than a quarter of a full sample
    /// was expired, the same database is sampled again.
    pub async fn run_cycle(&self) -> usize {
        let _gate = self.state.gate.shared().await;
        let mut total = 0;
        for db in 0..self.state.keyspace.db_count() {
            for _ in 0..TTL_MAX_LOOPS_PER_DB {
                let sample = self
                    .state
                    .keyspace
                    .sample_expired(db, TTL_SAMPLE_SIZE, |key| self.log_expiry(db, key));
                let expired = sample.expired.len();
                for key in &sample.expired {
                    self.state.watches.notify_watchers(db, key);
                }
                total += expired;
                if expired > 0 {
                    debug!("Purged {} expired keys from db {}.", expired, db);
                }
                if sample.sampled < TTL_SAMPLE_SIZE
                    || expired * 100 <= TTL_SAMPLE_SIZE * TTL_EXPIRED_THRESHOLD_PERCENT
                {
                    break;
                }
            }
        }
        if total > 0 {
            self.state.stats.add_expired_keys(total as u64);
        }
        total
    }

    fn log_expiry(&self, db: usize, key: &Bytes) {
        if let Some(aof) = &self.state.aof {
            aof.log(db, del_args(key));
        }
    }
}
