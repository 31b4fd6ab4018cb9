// src/core/commands/generic/dump.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::persistence::value_codec;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct Dump {
    pub key: Bytes,
}

impl ParseCommand for Dump {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 1, "DUMP")?;
        Ok(Dump {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Dump {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let payload = ctx.read(&self.key, |cell| {
            Ok(cell.map(|c| value_codec::dump(&c.data)))
        })?;
        let resp = payload.map_or(RespValue::Null, RespValue::BulkString);
        Ok((resp, WriteOutcome::DidNotWrite))
    }
}

impl CommandSpec for Dump {
    fn name(&self) -> &'static str {
        "dump"
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
