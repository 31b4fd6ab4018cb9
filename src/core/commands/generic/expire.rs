// src/core/commands/generic/expire.rs

use super::expire_variants::{deadline_after, set_expiry};
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
pub struct Expire {
    pub key: Bytes,
    pub seconds: i64,
}
impl ParseCommand for Expire {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 2, "EXPIRE")?;
        Ok(Expire {
            key: extract_bytes(&args[0])?,
            seconds: parse_i64(&args[1])?,
        })
    }
}
#[async_trait]
impl ExecutableCommand for Expire {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let millis = self
            .seconds
            .checked_mul(1000)
            .ok_or_else(|| invalid_expire("expire"))?;
        let deadline = deadline_after(millis).ok_or_else(|| invalid_expire("expire"))?;
        set_expiry(ctx, &self.key, deadline)
    }
}
impl CommandSpec for Expire {
    fn name(&self) -> &'static str {
        "expire"
    }
    fn arity(&self) -> i64 {
        3
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
        vec![self.key.clone(), self.seconds.to_string().into()]
    }
}

pub(super) fn invalid_expire(command: &str) -> CaradeError {
    CaradeError::InvalidRequest(format!("invalid expire time in '{command}' command"))
}
