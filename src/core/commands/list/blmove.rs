// src/core/commands/list/blmove.rs

//! Implements `BLMOVE` and `BRPOPLPUSH`.

use super::lmove::parse_side;
use super::logic::{Side, blocking_move};
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, format_timeout, parse_timeout, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// `BLMOVE source destination LEFT|RIGHT LEFT|RIGHT timeout`
#[derive(Debug, Clone, Default)]
pub struct BLMove {
    pub source: Bytes,
    pub destination: Bytes,
    pub from: Side,
    pub to: Side,
    pub timeout: Option<Duration>,
}

impl ParseCommand for BLMove {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 5, "BLMOVE")?;
        Ok(BLMove {
            source: extract_bytes(&args[0])?,
            destination: extract_bytes(&args[1])?,
            from: parse_side(&args[2])?,
            to: parse_side(&args[3])?,
            timeout: parse_timeout(&args[4])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for BLMove {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        blocking_move(
            ctx,
            &self.source,
            &self.destination,
            self.from,
            self.to,
            self.timeout,
        )
        .await
    }
}

impl CommandSpec for BLMove {
    fn name(&self) -> &'static str {
        "blmove"
    }
    fn arity(&self) -> i64 {
        6
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::DENY_OOM | CommandFlags::EXCLUSIVE | CommandFlags::BLOCKING
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
            format_timeout(self.timeout),
        ]
    }
}

/// `BRPOPLPUSH source destination timeout`
#[derive(Debug, Clone, Default)]
pub struct BRPopLPush {
    pub source: Bytes,
    pub destination: Bytes,
    pub timeout: Option<Duration>,
}

impl ParseCommand for BRPopLPush {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 3, "BRPOPLPUSH")?;
        Ok(BRPopLPush {
            source: extract_bytes(&args[0])?,
            destination: extract_bytes(&args[1])?,
            timeout: parse_timeout(&args[2])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for BRPopLPush {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        blocking_move(
            ctx,
            &self.source,
            &self.destination,
            Side::Right,
            Side::Left,
            self.timeout,
        )
        .await
    }
}

impl CommandSpec for BRPopLPush {
    fn name(&self) -> &'static str {
        "brpoplpush"
    }
    fn arity(&self) -> i64 {
        4
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::DENY_OOM | CommandFlags::EXCLUSIVE | CommandFlags::BLOCKING
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
            format_timeout(self.timeout),
        ]
    }
}
