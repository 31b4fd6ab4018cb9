// src/core/commands/list/blpop.rs

//! Implements the `BLPOP` command.

use super::logic::{Side, blocking_pop};
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, format_timeout, parse_timeout, validate_min_args};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// `BLPOP key [key ...] timeout`. A timeout of `None` waits forever.
#[derive(Debug, Clone, Default)]
pub struct BLPop {
    pub keys: Vec<Bytes>,
    pub timeout: Option<Duration>,
}

impl ParseCommand for BLPop {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_min_args(args, 2, "BLPOP")?;
        let (timeout_frame, key_frames) = args.split_last().ok_or(CaradeError::SyntaxError)?;
        Ok(BLPop {
            keys: key_frames.iter().map(extract_bytes).collect::<Result<_, _>>()?,
            timeout: parse_timeout(timeout_frame)?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for BLPop {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        blocking_pop(ctx, &self.keys, Side::Left, self.timeout).await
    }
}

impl CommandSpec for BLPop {
    fn name(&self) -> &'static str {
        "blpop"
    }
    fn arity(&self) -> i64 {
        -3
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::BLOCKING
    }
    fn first_key(&self) -> i64 {
        1
    }
    fn last_key(&self) -> i64 {
        -2
    }
    fn step(&self) -> i64 {
        1
    }
    fn get_keys(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = self.keys.clone();
        args.push(format_timeout(self.timeout));
        args
    }
}
