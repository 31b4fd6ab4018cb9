// src/connection/session.rs

//! Defines the state associated with a single client session.

use crate::core::handler::transaction_handler::TransactionState;
use crate::core::watch::WatchSet;

/// Holds the state specific to a single client session.
#[derive(Debug, Default)]
pub struct SessionState {
    /// The index of the database the client is currently using.
    pub current_db_index: usize,
    /// The open `MULTI` block, if any.
    pub transaction: Option<TransactionState>,
    /// Keys registered with `WATCH` since the last `EXEC`, `DISCARD` or `UNWATCH`.
    pub watches: WatchSet,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Marks the open transaction as failed so `EXEC` aborts it.
    pub fn mark_transaction_error(&mut self) {
        if let Some(tx) = self.transaction.as_mut() {
            tx.has_error = true;
        }
    }
}
