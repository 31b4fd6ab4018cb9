// src/core/commands/generic/persist.rs

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
pub struct Persist {
    pub key: Bytes,
}

impl ParseCommand for Persist {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 1, "PERSIST")?;
        Ok(Persist {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Persist {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let log_args = self.to_log_args();
        let cleared = ctx.compute(&self.key, |slot, fx| {
            match slot.as_mut() {
                Some(cell) if cell.expire_at.is_some() => {
                    cell.expire_at = None;
                    fx.propagate(&self.key, log_args);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })?;
        if cleared {
            Ok((RespValue::Integer(1), WriteOutcome::Write { keys_modified: 1 }))
        } else {
            Ok((RespValue::Integer(0), WriteOutcome::DidNotWrite))
        }
    }
}

impl CommandSpec for Persist {
    fn name(&self) -> &'static str {
        "persist"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE
    }
    fn first_key(&self) -> i64 {
        1
    }
    fn last_key(&self) -> i64 {
        1
    }
    fn step(&self) -> i64 {
        1
    }
    fn get_keys(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        vec![self.key.clone()]
    }
}
