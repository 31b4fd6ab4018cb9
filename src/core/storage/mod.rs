// src/core/storage/mod.rs

//! The in-memory data layer: value cells, the per-database keyspace, the
//! sorted-set and HyperLogLog payloads, eviction and active expiry.

pub mod context;
pub mod data_types;
pub mod eviction;
pub mod hll;
pub mod key_index;
pub mod keyspace;
pub mod ttl;
pub mod zset;

pub use context::{Effects, ExecutionContext, Journal};
pub use keyspace::Keyspace;
