// src/core/gate.rs

//! The process-wide shared/exclusive lock around keyspace mutation.
//!
//! Single-key commands run under the shared side and rely on the keyspace's
//! per-key atomicity. Commands that span keys or the whole keyspace (`RENAME`,
//! `MSET`, flushes, `EXEC`, the rewrite snapshot and swap) take the exclusive
//! side, so they never interleave with any other mutation.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

pub type SharedGuard = OwnedRwLockReadGuard<()>;
pub type ExclusiveGuard = OwnedRwLockWriteGuard<()>;

/// Which side of the gate a caller currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    Shared,
    Exclusive,
    Released,
}

#[derive(Debug, Clone, Default)]
pub struct Gate {
    lock: Arc<RwLock<()>>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the shared side. The guard releases on drop.
    pub async fn shared(&self) -> SharedGuard {
        self.lock.clone().read_owned().await
    }

    /// Waits until no other holder remains, shared or exclusive.
    pub async fn exclusive(&self) -> ExclusiveGuard {
        self.lock.clone().write_owned().await
    }

    pub async fn with_shared<F, Fut, R>(&self, f: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let _guard = self.shared().await;
        f().await
    }

    pub async fn with_exclusive<F, Fut, R>(&self, f: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let _guard = self.exclusive().await;
        f().await
    }
}

/// The gate guard a command execution holds, if any.
#[derive(Debug, Default)]
pub enum ExecutionLocks {
    Shared(SharedGuard),
    Exclusive(ExclusiveGuard),
    #[default]
    None,
}

impl ExecutionLocks {
    pub fn mode(&self) -> GateMode {
        match self {
            ExecutionLocks::Shared(_) => GateMode::Shared,
            ExecutionLocks::Exclusive(_) => GateMode::Exclusive,
            ExecutionLocks::None => GateMode::Released,
        }
    }
}
