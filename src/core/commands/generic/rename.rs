// src/core/commands/generic/rename.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct Rename {
    pub source: Bytes,
    pub destination: Bytes,
}

impl ParseCommand for Rename {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 2, "RENAME")?;
        Ok(Rename {
            source: extract_bytes(&args[0])?,
            destination: extract_bytes(&args[1])?,
        })
    }
}

/// Runs with the gate held exclusively, so the remove and the insert are one step
/// for every other client.
#[async_trait]
impl ExecutableCommand for Rename {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        if !ctx.read(&self.source, |cell| Ok(cell.is_some()))? {
            return Err(CaradeError::KeyNotFound);
        }
        if self.source == self.destination {
            return Ok((RespValue::ok(), WriteOutcome::DidNotWrite));
        }
        let cell = ctx
            .state
            .keyspace
            .remove(ctx.db, &self.source)
            .ok_or(CaradeError::KeyNotFound)?;
        ctx.state
            .keyspace
            .put(ctx.db, self.destination.clone(), cell);

        ctx.log(self.to_log_args());
        ctx.touch(&self.source);
        ctx.touch(&self.destination);
        Ok((RespValue::ok(), WriteOutcome::Write { keys_modified: 2 }))
    }
}

impl CommandSpec for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::EXCLUSIVE
    }
    fn first_key(&self) -> i64 {
        1
    }
    fn last_key(&self) -> i64 {
        2
    }
    fn step(&self) -> i64 {
        1
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.source.clone(), self.destination.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.source.clone(), self.destination.clone()]
    }
}
