// src/core/handler/transaction_handler.rs

//! Manages the logic for transactions: command queuing, optimistic locking
//! with `WATCH`, and execution of the queue under the exclusive gate.

use crate::connection::SessionState;
use crate::core::commands::command_trait::{CommandExt, CommandFlags, WriteOutcome};
use crate::core::gate::ExecutionLocks;
use crate::core::state::ServerState;
use crate::core::storage::ExecutionContext;
use crate::core::storage::context::Journal;
use crate::core::{CaradeError, Command, RespValue};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// The queue a session builds between `MULTI` and `EXEC`.
#[derive(Debug, Default)]
pub struct TransactionState {
    pub queued: Vec<Command>,
    /// Set by a queue-time error; `EXEC` then aborts without running anything.
    pub has_error: bool,
}

/// Handles the business logic for a transaction for a single client session.
pub struct TransactionHandler<'a> {
    state: Arc<ServerState>,
    session_id: u64,
    session: &'a mut SessionState,
}

impl<'a> TransactionHandler<'a> {
    pub fn new(state: Arc<ServerState>, session_id: u64, session: &'a mut SessionState) -> Self {
        Self {
            state,
            session_id,
            session,
        }
    }

    /// Handles the `MULTI` command, starting a new transaction for the session.
    pub fn handle_multi(&mut self) -> Result<RespValue, CaradeError> {
        if let Some(tx) = self.session.transaction.as_mut() {
            tx.has_error = true;
            return Err(CaradeError::InvalidState(
                "MULTI calls can not be nested".to_string(),
            ));
        }
        self.session.transaction = Some(TransactionState::default());
        Ok(RespValue::ok())
    }

    /// Handles a command received after `MULTI`.
    pub fn handle_queueing(&mut self, command: Command) -> Result<RespValue, CaradeError> {
        let tx = self
            .session
            .transaction
            .as_mut()
            .ok_or_else(|| CaradeError::InvalidState("Command queued without MULTI".to_string()))?;

        if matches!(command, Command::Watch(_)) {
            tx.has_error = true;
            return Err(CaradeError::InvalidState(
                "WATCH inside MULTI is not allowed".to_string(),
            ));
        }
        if command.get_flags().contains(CommandFlags::TRANSACTION) {
            tx.has_error = true;
            return Err(CaradeError::InvalidState(format!(
                "Command '{}' cannot be used in a transaction",
                command.name()
            )));
        }

        tx.queued.push(command);
        Ok(RespValue::SimpleString("QUEUED".into()))
    }

    /// Handles the `WATCH` command, registering keys for optimistic locking.
    pub fn handle_watch(&mut self, keys: Vec<Bytes>) -> Result<RespValue, CaradeError> {
        if let Some(tx) = self.session.transaction.as_mut() {
            tx.has_error = true;
            return Err(CaradeError::InvalidState(
                "WATCH inside MULTI is not allowed".to_string(),
            ));
        }
        let db = self.session.current_db_index;
        for key in keys {
            self.session.watches.add(&self.state.watches, db, key);
        }
        Ok(RespValue::ok())
    }

    pub fn handle_unwatch(&mut self) -> Result<RespValue, CaradeError> {
        self.session.watches.clear(&self.state.watches);
        Ok(RespValue::ok())
    }

    /// Handles the `DISCARD` command, aborting the transaction.
    pub fn handle_discard(&mut self) -> Result<RespValue, CaradeError> {
        if self.session.transaction.take().is_none() {
            return Err(CaradeError::InvalidState("DISCARD without MULTI".to_string()));
        }
        self.session.watches.clear(&self.state.watches);
        Ok(RespValue::ok())
    }

    /// Handles the `EXEC` command.
    ///
    /// Replies with `EXECABORT` after a queue-time error, a null array when a
    /// watched key was touched, and otherwise with one reply per queued command.
    pub async fn handle_exec(&mut self) -> Result<RespValue, CaradeError> {
        let tx = self
            .session
            .transaction
            .take()
            .ok_or_else(|| CaradeError::InvalidState("EXEC without MULTI".to_string()))?;

        if tx.has_error {
            self.session.watches.clear(&self.state.watches);
            return Err(CaradeError::ExecAborted);
        }

        let guard = self.state.gate.exclusive().await;

        // Checked under the gate, so nothing can dirty a watched key between the check and the run.
        let dirty = self.session.watches.is_dirty();
        self.session.watches.clear(&self.state.watches);
        if dirty {
            debug!("Session {}: watched key modified, aborting EXEC.", self.session_id);
            return Ok(RespValue::NullArray);
        }

        let mut ctx = ExecutionContext::new(
            self.state.clone(),
            self.session.current_db_index,
            self.session_id,
            ExecutionLocks::Exclusive(guard),
        );
        if !matches!(ctx.journal, Journal::Off) {
            ctx.journal = Journal::Batch(Vec::new());
        }
        ctx.in_transaction = true;

        let (responses, outcome) = self.execute_queued_commands(&tx.queued, &mut ctx).await;

        if let Journal::Batch(records) = std::mem::replace(&mut ctx.journal, Journal::Off)
            && let Some(aof) = &self.state.aof
        {
            aof.log_transaction(records);
        }
        ctx.flush_effects();
        self.session.current_db_index = ctx.db;
        self.state
            .persistence
            .increment_dirty_keys(outcome.dirty_count());

        Ok(RespValue::Array(responses))
    }

    /// Runs the queue in order. A failing command yields an error reply and the rest still run.
    async fn execute_queued_commands(
        &self,
        commands: &[Command],
        ctx: &mut ExecutionContext,
    ) -> (Vec<RespValue>, WriteOutcome) {
        let mut responses = Vec::with_capacity(commands.len());
        let mut outcome = WriteOutcome::DidNotWrite;

        for command in commands {
            if command.get_flags().contains(CommandFlags::DENY_OOM)
                && let Err(e) = self.state.ensure_capacity()
            {
                responses.push(RespValue::Error(e.to_string()));
                continue;
            }
            self.state.stats.increment_total_commands();
            match command.execute(ctx).await {
                Ok((resp, write)) => {
                    responses.push(resp);
                    outcome = outcome.merge(write);
                }
                Err(e) => responses.push(RespValue::Error(e.to_string())),
            }
        }
        (responses, outcome)
    }
}
