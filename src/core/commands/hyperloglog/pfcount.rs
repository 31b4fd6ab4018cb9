// src/core/commands/hyperloglog/pfcount.rs

use super::union_of;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::parse_keys;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `PFCOUNT key [key ...]`: the estimated cardinality of the union of the given sketches.
#[derive(Debug, Clone, Default)]
pub struct PfCount {
    pub keys: Vec<Bytes>,
}

impl ParseCommand for PfCount {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        Ok(PfCount {
            keys: parse_keys(args, "PFCOUNT")?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for PfCount {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let merged = union_of(ctx, &self.keys)?;
        Ok((
            RespValue::Integer(merged.count() as i64),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for PfCount {
    fn name(&self) -> &'static str {
        "pfcount"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::READONLY
    }
    fn first_key(&self) -> i64 {
        1
    }
    fn last_key(&self) -> i64 {
        -1
    }
    fn step(&self) -> i64 {
        1
    }
    fn get_keys(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
}
