// src/core/commands/string/decrby.rs

use super::incr::do_incr_decr_by;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, parse_i64, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct DecrBy {
    pub key: Bytes,
    pub decrement: i64,
}

impl ParseCommand for DecrBy {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 2, "DECRBY")?;
        Ok(DecrBy {
            key: extract_bytes(&args[0])?,
            decrement: parse_i64(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for DecrBy {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let by = self.decrement.checked_neg().ok_or(CaradeError::Overflow)?;
        do_incr_decr_by(&self.key, by, ctx)
    }
}

impl CommandSpec for DecrBy {
    fn name(&self) -> &'static str {
        "decrby"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::DENY_OOM
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
        vec![self.key.clone(), self.decrement.to_string().into()]
    }
}
