// src/core/commands/generic/select.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_string, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct Select {
    pub db_index: usize,
}

impl ParseCommand for Select {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 1, "SELECT")?;
        let index = extract_string(&args[0])?
            .parse::<usize>()
            .map_err(|_| CaradeError::InvalidState("invalid DB index".into()))?;
        Ok(Select { db_index: index })
    }
}

/// Switches the context's database. The router copies it back into the
/// session, so a `SELECT` queued in `MULTI` takes effect in order.
#[async_trait]
impl ExecutableCommand for Select {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        if self.db_index >= ctx.state.keyspace.db_count() {
            return Err(CaradeError::DbIndexOutOfRange);
        }
        ctx.db = self.db_index;
        Ok((RespValue::ok(), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Select {
    fn name(&self) -> &'static str {
        "select"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn first_key(&self) -> i64 {
        0
    }
    fn last_key(&self) -> i64 {
        0
    }
    fn step(&self) -> i64 {
        0
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.db_index.to_string().into()]
    }
}
