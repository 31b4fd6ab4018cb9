// src/core/tasks/mod.rs

//! Long-running background tasks that support the server: automatic log
//! rewrites and the periodic stats line. Active expiry lives with the
//! keyspace in `storage::ttl`.

pub mod monitor;
pub mod persistence;
