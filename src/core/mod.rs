// src/core/mod.rs

//! The central module containing the core logic and data structures of Carade.

pub mod blocking;
pub mod commands;
pub mod errors;
pub mod gate;
pub mod handler;
pub mod persistence;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod watch;

pub use commands::Command;
pub use errors::CaradeError;
pub use protocol::RespValue;
