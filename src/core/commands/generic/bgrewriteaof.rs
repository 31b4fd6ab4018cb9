// src/core/commands/generic/bgrewriteaof.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::persistence::spawn_rewrite;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct BgRewriteAof;

impl ParseCommand for BgRewriteAof {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 0, "BGREWRITEAOF")?;
        Ok(BgRewriteAof)
    }
}

#[async_trait]
impl ExecutableCommand for BgRewriteAof {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        if ctx.state.aof.is_none() {
            return Err(CaradeError::InvalidState(
                "append only file is disabled".into(),
            ));
        }
        spawn_rewrite(&ctx.state)?;
        Ok((
            RespValue::SimpleString("Background append only file rewriting started".into()),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for BgRewriteAof {
    fn name(&self) -> &'static str {
        "bgrewriteaof"
    }
    fn arity(&self) -> i64 {
        1
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::ADMIN
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
        vec![]
    }
}
