// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::ServerState;
use crate::core::watch::WatchSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Releases everything a connection registered in shared state when the
/// handler's scope is exited, however it exits.
pub struct ConnectionGuard {
    pub(crate) state: Arc<ServerState>,
    pub(crate) session_id: u64,
    pub(crate) addr: SocketAddr,
    /// The session's watch registrations, handed over at the end of the connection.
    watches: Option<WatchSet>,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<ServerState>, session_id: u64, addr: SocketAddr) -> Self {
        state.stats.client_connected();
        Self {
            state,
            session_id,
            addr,
            watches: None,
        }
    }

    /// Hands the session's watch set to the guard so `Drop` unregisters it.
    pub(crate) fn release_watches(&mut self, watches: WatchSet) {
        self.watches = Some(watches);
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!(
            "ConnectionGuard dropping, cleaning up resources for connection {}",
            self.addr
        );
        self.state
            .blocker_manager
            .remove_waiters_for_session(self.session_id);
        if let Some(mut watches) = self.watches.take() {
            watches.clear(&self.state.watches);
        }
        self.state.stats.client_disconnected();
    }
}
