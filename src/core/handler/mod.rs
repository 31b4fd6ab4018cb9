// src/core/handler/mod.rs

//! Routing of parsed commands: gate selection, execution and the
//! per-connection `MULTI`/`EXEC` state machine.

pub mod command_router;
pub mod transaction_handler;
