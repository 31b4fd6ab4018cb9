// src/core/commands/zset/bzpopmin.rs

use super::zpop_logic::{PopSide, blocking_zpop};
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, format_timeout, parse_timeout};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// `BZPOPMIN key [key ...] timeout`
#[derive(Debug, Clone, Default)]
pub struct BZPopMin {
    pub keys: Vec<Bytes>,
    pub timeout: Option<Duration>,
}

impl ParseCommand for BZPopMin {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        if args.len() < 2 {
            return Err(CaradeError::WrongArgumentCount("BZPOPMIN".to_string()));
        }
        let (timeout, keys) = args.split_last().ok_or(CaradeError::SyntaxError)?;
        Ok(BZPopMin {
            keys: keys.iter().map(extract_bytes).collect::<Result<_, _>>()?,
            timeout: parse_timeout(timeout)?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for BZPopMin {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        blocking_zpop(ctx, &self.keys, PopSide::Min, self.timeout).await
    }
}

impl CommandSpec for BZPopMin {
    fn name(&self) -> &'static str {
        "bzpopmin"
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
