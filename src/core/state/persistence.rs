// src/core/state/persistence.rs

//! State shared between the append log writer, the rewriter and the commands that trigger them.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct PersistenceState {
    /// Set from the rewrite snapshot until the new file is installed or the attempt fails.
    pub rewrite_in_progress: AtomicBool,
    /// A handle to the spawned AOF rewrite task, if any.
    pub aof_rewrite_handle: Mutex<Option<JoinHandle<()>>>,
    /// The size of the AOF file at the end of the last successful rewrite.
    /// Used by the auto-rewrite manager to calculate growth percentage.
    pub aof_last_rewrite_size: AtomicU64,
    /// Mutations applied since startup.
    pub dirty_keys_counter: AtomicU64,
}

impl PersistenceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_dirty_keys(&self, count: u64) {
        self.dirty_keys_counter.fetch_add(count, Ordering::Relaxed);
    }

    pub fn is_rewriting(&self) -> bool {
        self.rewrite_in_progress.load(Ordering::Acquire)
    }

    /// Takes the handle of the last spawned rewrite so shutdown can wait for it.
    pub fn take_rewrite_handle(&self) -> Option<JoinHandle<()>> {
        self.aof_rewrite_handle.lock().take()
    }
}
