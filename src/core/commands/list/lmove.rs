// src/core/commands/list/lmove.rs

use super::logic::{Side, list_move_logic};
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, extract_string, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

pub(super) fn parse_side(frame: &RespFrame) -> Result<Side, CaradeError> {
    extract_string(frame)?
        .parse::<Side>()
        .map_err(|_| CaradeError::SyntaxError)
}

fn moved_reply(value: Option<Bytes>) -> (RespValue, WriteOutcome) {
    match value {
        Some(value) => (
            RespValue::BulkString(value),
            WriteOutcome::Write { keys_modified: 2 },
        ),
        None => (RespValue::Null, WriteOutcome::DidNotWrite),
    }
}

/// `LMOVE source destination LEFT|RIGHT LEFT|RIGHT`
#[derive(Debug, Clone, Default)]
pub struct LMove {
    pub source: Bytes,
    pub destination: Bytes,
    pub from: Side,
    pub to: Side,
}

impl ParseCommand for LMove {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 4, "LMOVE")?;
        Ok(LMove {
            source: extract_bytes(&args[0])?,
            destination: extract_bytes(&args[1])?,
            from: parse_side(&args[2])?,
            to: parse_side(&args[3])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for LMove {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let moved = list_move_logic(ctx, &self.source, &self.destination, self.from, self.to)?;
        Ok(moved_reply(moved))
    }
}

impl CommandSpec for LMove {
    fn name(&self) -> &'static str {
        "lmove"
    }
    fn arity(&self) -> i64 {
        5
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::DENY_OOM | CommandFlags::EXCLUSIVE
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
        vec![
            self.source.clone(),
            self.destination.clone(),
            self.from.as_bytes(),
            self.to.as_bytes(),
        ]
    }
}

/// `RPOPLPUSH source destination`, the `RIGHT LEFT` form of `LMOVE`.
#[derive(Debug, Clone, Default)]
pub struct RPopLPush {
    pub source: Bytes,
    pub destination: Bytes,
}

impl ParseCommand for RPopLPush {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 2, "RPOPLPUSH")?;
        Ok(RPopLPush {
            source: extract_bytes(&args[0])?,
            destination: extract_bytes(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for RPopLPush {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let moved =
            list_move_logic(ctx, &self.source, &self.destination, Side::Right, Side::Left)?;
        Ok(moved_reply(moved))
    }
}

impl CommandSpec for RPopLPush {
    fn name(&self) -> &'static str {
        "rpoplpush"
    }
    fn arity(&self) -> i64 {
        3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::DENY_OOM | CommandFlags::EXCLUSIVE
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
