// src/core/storage/context.rs

use super::data_types::ValueCell;
use crate::core::CaradeError;
use crate::core::gate::{ExecutionLocks, GateMode};
use crate::core::persistence::{AppendLog, LogRecord};
use crate::core::state::ServerState;
use bytes::Bytes;
use std::sync::Arc;

/// Where an execution sends the records of its mutations.
#[derive(Debug)]
pub enum Journal {
    /// Straight to the writer task.
    Live(AppendLog),
    /// Collected for a transaction and logged as one unit by `EXEC`.
    Batch(Vec<LogRecord>),
    /// Nothing is recorded: replay, or a server without an append log.
    Off,
}

impl Journal {
    pub fn for_state(state: &ServerState) -> Self {
        match &state.aof {
            Some(aof) => Journal::Live(aof.clone()),
            None => Journal::Off,
        }
    }

    pub fn record(&mut self, db: usize, args: Vec<Bytes>) {
        match self {
            Journal::Live(aof) => aof.log(db, args),
            Journal::Batch(records) => records.push(LogRecord::new(db, args)),
            Journal::Off => {}
        }
    }
}

/// Mutation side effects gathered while a key's compute guard is held.
pub struct Effects<'c> {
    db: usize,
    journal: &'c mut Journal,
    touched: &'c mut Vec<(usize, Bytes)>,
}

impl Effects<'_> {
    /// Logs `args` and marks `key` for watcher and waiter notification.
    pub fn propagate(&mut self, key: &Bytes, args: Vec<Bytes>) {
        self.journal.record(self.db, args);
        self.touch(key);
    }

    pub fn touch(&mut self, key: &Bytes) {
        self.touched.push((self.db, key.clone()));
    }
}

/// The record that removes `key`.
pub fn del_args(key: &Bytes) -> Vec<Bytes> {
    vec![Bytes::from_static(b"DEL"), key.clone()]
}

/// `ExecutionContext` carries everything a `Command` needs to run.
pub struct ExecutionContext {
    pub state: Arc<ServerState>,
    /// The selected database. `SELECT` changes it in place.
    pub db: usize,
    pub session_id: u64,
    pub locks: ExecutionLocks,
    pub journal: Journal,
    /// Keys mutated by this execution, flushed by `flush_effects`.
    pub touched: Vec<(usize, Bytes)>,
    /// Set while running the queue of an `EXEC`; blocking commands do not block.
    pub in_transaction: bool,
}

impl ExecutionContext {
    pub fn new(state: Arc<ServerState>, db: usize, session_id: u64, locks: ExecutionLocks) -> Self {
        let journal = Journal::for_state(&state);
        Self {
            state,
            db,
            session_id,
            locks,
            journal,
            touched: Vec::new(),
            in_transaction: false,
        }
    }

    /// A context for replaying the append log at startup.
    pub fn for_replay(state: Arc<ServerState>) -> Self {
        Self {
            state,
            db: 0,
            session_id: 0,
            locks: ExecutionLocks::None,
            journal: Journal::Off,
            touched: Vec::new(),
            in_transaction: false,
        }
    }

    pub fn gate_mode(&self) -> GateMode {
        self.locks.mode()
    }

    /// Drops the gate guard this execution holds. Blocking commands call this before they wait.
    pub fn release_locks(&mut self) {
        self.locks = ExecutionLocks::None;
    }

    /// Reads `key` in the selected database.
    ///
    /// Finding it expired removes it, logs `DEL key` under the key's guard and
    /// dirties its watchers.
    pub fn read<R, F>(&mut self, key: &Bytes, f: F) -> Result<R, CaradeError>
    where
        F: FnOnce(Option<&ValueCell>) -> Result<R, CaradeError>,
    {
        let db = self.db;
        let journal = &mut self.journal;
        let watches = &self.state.watches;
        self.state.keyspace.read_observed(
            db,
            key,
            |k| {
                journal.record(db, del_args(k));
                watches.notify_watchers(db, k);
            },
            f,
        )
    }

    /// Atomically updates `key` in the selected database.
    ///
    /// `f` records what it logs through `Effects`, inside the same guard as the
    /// mutation, so the log order matches the order of mutations. An expired
    /// cell dropped to make room is logged as `DEL key` ahead of whatever `f`
    /// records, so replay does not resurrect it under the write.
    pub fn compute<R, F>(&mut self, key: &Bytes, f: F) -> Result<R, CaradeError>
    where
        F: FnOnce(&mut Option<ValueCell>, &mut Effects<'_>) -> Result<R, CaradeError>,
    {
        let mut effects = Effects {
            db: self.db,
            journal: &mut self.journal,
            touched: &mut self.touched,
        };
        self.state.keyspace.compute_observed(self.db, key, |slot, expired| {
            if expired {
                effects.propagate(key, del_args(key));
            }
            f(slot, &mut effects)
        })
    }

    /// Removes `key`, logging `DEL key` while its guard is held. Returns the live value it held.
    pub fn remove_key(&mut self, key: &Bytes) -> Option<ValueCell> {
        let db = self.db;
        let journal = &mut self.journal;
        let removed = self
            .state
            .keyspace
            .remove_with(db, key, |k| journal.record(db, del_args(k)));
        if removed.is_some() {
            self.touch(key);
        }
        removed
    }

    /// Logs a record outside any compute guard. Used by commands that hold the gate exclusively.
    pub fn log(&mut self, args: Vec<Bytes>) {
        self.journal.record(self.db, args);
    }

    /// Logs `args` and marks `key` as mutated.
    pub fn propagate(&mut self, key: &Bytes, args: Vec<Bytes>) {
        self.log(args);
        self.touch(key);
    }

    pub fn touch(&mut self, key: &Bytes) {
        self.touched.push((self.db, key.clone()));
    }

    /// Flips the watch flags and serves waiters for every key this execution mutated.
    ///
    /// Must run while the gate guard is still held, after the records are logged.
    pub fn flush_effects(&mut self) {
        if self.touched.is_empty() {
            return;
        }
        let mut touched = std::mem::take(&mut self.touched);
        touched.sort_unstable();
        touched.dedup();
        let mode = self.gate_mode();
        for (db, key) in touched {
            self.state.watches.notify_watchers(db, &key);
            self.state
                .blocker_manager
                .on_key_mutated(&self.state, db, &key, mode);
        }
    }
}
