// src/core/commands/generic/pttl.rs

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

/// Time to live in milliseconds. `-2` if the key does not exist, `-1` if it has no expiry.
#[derive(Debug, Clone, Default)]
pub struct Pttl {
    pub key: Bytes,
}

impl ParseCommand for Pttl {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 1, "PTTL")?;
        Ok(Pttl {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Pttl {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let ttl = ctx.read(&self.key, |cell| {
            Ok(match cell {
                None => -2,
                Some(cell) => match cell.remaining_ttl_ms() {
                    None => -1,
                    Some(ms) => ms as i64,
                },
            })
        })?;
        Ok((RespValue::Integer(ttl), WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Pttl {
    fn name(&self) -> &'static str {
        "pttl"
    }
    fn arity(&self) -> i64 {
        2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
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
