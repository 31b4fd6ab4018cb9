// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::persistence::PersistenceState;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::CaradeError;
use crate::core::blocking::BlockerManager;
use crate::core::gate::Gate;
use crate::core::persistence::{AofMessage, AppendLog};
use crate::core::storage::Keyspace;
use crate::core::storage::context::del_args;
use crate::core::watch::WatchRegistry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Everything produced by `ServerState::initialize` that the spawner consumes.
pub struct ServerInit {
    /// The fully initialized, shared server state.
    pub state: Arc<ServerState>,
    /// Receives entries for the AOF writer task, if AOF is enabled.
    pub aof_rx: Option<mpsc::UnboundedReceiver<AofMessage>>,
}

/// The central struct holding all shared, server-wide state.
///
/// It is wrapped in an `Arc` and handed to every connection and background
/// task; the server keeps no process globals.
#[derive(Debug)]
pub struct ServerState {
    pub config: Config,
    pub keyspace: Keyspace,
    /// Orders multi-key operations against everything else.
    pub gate: Gate,
    /// Manages clients blocked on list/zset commands (e.g., `BLPOP`).
    pub blocker_manager: Arc<BlockerManager>,
    pub watches: WatchRegistry,
    /// The append log handle. `None` when AOF is disabled.
    pub aof: Option<AppendLog>,
    pub persistence: PersistenceState,
    pub stats: StatsState,
}

impl ServerState {
    /// Builds the shared state from `config`.
    ///
    /// No file is touched here: replay and opening the log for append are done
    /// by the server initialization that follows.
    pub fn initialize(config: Config) -> Result<ServerInit, CaradeError> {
        if config.databases == 0 {
            return Err(CaradeError::InvalidState("databases must be at least 1".into()));
        }
        let (aof, aof_rx) = if config.persistence.aof_enabled {
            let (handle, rx) = AppendLog::channel(&config.persistence.aof_path);
            (Some(handle), Some(rx))
        } else {
            (None, None)
        };

        let state = Arc::new(Self {
            keyspace: Keyspace::new(config.databases),
            gate: Gate::new(),
            blocker_manager: Arc::new(BlockerManager::new()),
            watches: WatchRegistry::new(),
            aof,
            persistence: PersistenceState::new(),
            stats: StatsState::new(),
            config,
        });

        Ok(ServerInit { state, aof_rx })
    }

    /// Evicts keys under the configured policy until memory is back under `maxmemory`.
    ///
    /// Callers hold the gate. Each victim is logged as `DEL` and its watchers are notified.
    pub fn ensure_capacity(&self) -> Result<(), CaradeError> {
        let Some(limit) = self.config.maxmemory else {
            return Ok(());
        };
        while self.keyspace.used_memory() > limit {
            let evicted = self
                .keyspace
                .evict_one(self.config.maxmemory_policy, |db, key| {
                    if let Some(aof) = &self.aof {
                        aof.log(db, del_args(key));
                    }
                });
            match evicted {
                Some((db, key)) => {
                    self.watches.notify_watchers(db, &key);
                    self.stats.increment_evicted_keys();
                }
                None => {
                    warn!(
                        "Used memory {} exceeds maxmemory {} and nothing can be evicted.",
                        self.keyspace.used_memory(),
                        limit
                    );
                    return Err(CaradeError::MaxMemoryReached);
                }
            }
        }
        Ok(())
    }
}
