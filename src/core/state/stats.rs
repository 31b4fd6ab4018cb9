// src/core/state/stats.rs

//! Contains state definitions and logic for server statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Server-wide counters, read by the stats monitor.
#[derive(Debug, Default)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of commands processed by the server since startup.
    total_commands: AtomicU64,
    connected_clients: AtomicUsize,
    expired_keys: AtomicU64,
    evicted_keys: AtomicU64,
}

impl StatsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a new connection and returns the number of clients now connected.
    pub fn client_connected(&self) -> usize {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.connected_clients.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn client_disconnected(&self) {
        let _ = self
            .connected_clients
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
    }

    pub fn connected_clients(&self) -> usize {
        self.connected_clients.load(Ordering::Relaxed)
    }

    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn increment_total_commands(&self) {
        self.total_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_commands(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    pub fn add_expired_keys(&self, count: u64) {
        self.expired_keys.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_expired_keys(&self) -> u64 {
        self.expired_keys.load(Ordering::Relaxed)
    }

    pub fn increment_evicted_keys(&self) {
        self.evicted_keys.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_evicted_keys(&self) -> u64 {
        self.evicted_keys.load(Ordering::Relaxed)
    }
}
