// src/core/handler/command_router.rs

//! The central component for routing parsed commands to their handlers.
//!
//! The `Router` receives a parsed `Command` from the `ConnectionHandler`,
//! deals with the session-level commands itself (transactions, `WATCH`,
//! `QUIT`) and runs everything else under the side of the gate the command's
//! flags ask for.

use super::transaction_handler::TransactionHandler;
use crate::connection::SessionState;
use crate::core::commands::command_trait::{CommandExt, CommandFlags};
use crate::core::gate::ExecutionLocks;
use crate::core::state::ServerState;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, Command, RespValue};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{Instrument, info_span};

/// What the connection should do with a routed command's result.
#[derive(Debug)]
pub enum RouteResponse {
    /// Send the reply and keep reading.
    Single(RespValue),
    /// Send the reply, then close the connection (`QUIT`).
    Close(RespValue),
}

/// The `Router` receives a parsed `Command` and directs it through the processing pipeline.
pub struct Router<'a> {
    state: Arc<ServerState>,
    session_id: u64,
    addr: SocketAddr,
    session: &'a mut SessionState,
}

impl<'a> Router<'a> {
    pub fn new(
        state: Arc<ServerState>,
        session_id: u64,
        addr: SocketAddr,
        session: &'a mut SessionState,
    ) -> Self {
        Self {
            state,
            session_id,
            addr,
            session,
        }
    }

    /// The main entry point for routing a command.
    pub async fn route(&mut self, command: Command) -> Result<RouteResponse, CaradeError> {
        let span = info_span!(
            "command",
            name = %command.name(),
            client.addr = %self.addr,
            client.id = %self.session_id,
        );

        async move {
            if self.session.in_transaction() {
                self.handle_transaction_mode(command).await
            } else {
                self.state.stats.increment_total_commands();
                self.handle_normal_command(command).await
            }
        }
        .instrument(span)
        .await
    }

    /// Inside `MULTI`, everything but the transaction controls is queued.
    async fn handle_transaction_mode(
        &mut self,
        command: Command,
    ) -> Result<RouteResponse, CaradeError> {
        if matches!(
            command,
            Command::Exec(_) | Command::Discard(_) | Command::Unwatch(_) | Command::Quit(_)
        ) {
            return self.handle_normal_command(command).await;
        }
        let mut handler = self.transaction_handler();
        let reply = match command {
            Command::Multi(_) => handler.handle_multi()?,
            Command::Watch(cmd) => handler.handle_watch(cmd.keys)?,
            cmd => handler.handle_queueing(cmd)?,
        };
        Ok(RouteResponse::Single(reply))
    }

    async fn handle_normal_command(
        &mut self,
        command: Command,
    ) -> Result<RouteResponse, CaradeError> {
        let reply = match command {
            Command::Quit(_) => return Ok(RouteResponse::Close(RespValue::ok())),
            Command::Multi(_) => self.transaction_handler().handle_multi()?,
            Command::Exec(_) => self.transaction_handler().handle_exec().await?,
            Command::Discard(_) => self.transaction_handler().handle_discard()?,
            Command::Watch(cmd) => self.transaction_handler().handle_watch(cmd.keys)?,
            Command::Unwatch(_) => self.transaction_handler().handle_unwatch()?,
            cmd => self.execute_command(cmd).await?,
        };
        Ok(RouteResponse::Single(reply))
    }

    fn transaction_handler(&mut self) -> TransactionHandler<'_> {
        TransactionHandler::new(self.state.clone(), self.session_id, &mut *self.session)
    }

    /// Acquires the gate for `command`, runs it and flushes its side effects
    /// before the gate is released.
    async fn execute_command(&mut self, command: Command) -> Result<RespValue, CaradeError> {
        let flags = command.get_flags();
        let locks = if flags.contains(CommandFlags::EXCLUSIVE) {
            ExecutionLocks::Exclusive(self.state.gate.exclusive().await)
        } else {
            ExecutionLocks::Shared(self.state.gate.shared().await)
        };

        if flags.contains(CommandFlags::DENY_OOM) {
            self.state.ensure_capacity()?;
        }

        let mut ctx = ExecutionContext::new(
            self.state.clone(),
            self.session.current_db_index,
            self.session_id,
            locks,
        );
        let result = command.execute(&mut ctx).await;

        // Mutations made before an error still wake watchers and waiters.
        ctx.flush_effects();
        self.session.current_db_index = ctx.db;

        let (reply, outcome) = result?;
        self.state
            .persistence
            .increment_dirty_keys(outcome.dirty_count());
        Ok(reply)
    }
}
