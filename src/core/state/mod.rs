// src/core/state/mod.rs

//! Defines the central `ServerState` struct and the state components it owns.

mod core;
mod persistence;
mod stats;

pub use core::{ServerInit, ServerState};
pub use persistence::PersistenceState;
pub use stats::StatsState;
