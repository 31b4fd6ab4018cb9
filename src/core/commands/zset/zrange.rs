// src/core/commands/zset/zrange.rs

use super::helpers::{format_zrange_response, read_zset};
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, parse_i64};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

fn parse_rank_range(args: &[RespFrame], cmd: &str) -> Result<(Bytes, i64, i64, bool), CaradeError> {
    if !(3..=4).contains(&args.len()) {
        return Err(CaradeError::WrongArgumentCount(cmd.to_string()));
    }
    let with_scores = match args.get(3) {
        Some(frame) if extract_bytes(frame)?.eq_ignore_ascii_case(b"withscores") => true,
        Some(_) => return Err(CaradeError::SyntaxError),
        None => false,
    };
    Ok((
        extract_bytes(&args[0])?,
        parse_i64(&args[1])?,
        parse_i64(&args[2])?,
        with_scores,
    ))
}

/// `ZRANGE key start stop [WITHSCORES]`, ascending by score.
#[derive(Debug, Clone, Default)]
pub struct ZRange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
    pub with_scores: bool,
}

impl ParseCommand for ZRange {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, start, stop, with_scores) = parse_rank_range(args, "ZRANGE")?;
        Ok(ZRange {
            key,
            start,
            stop,
            with_scores,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZRange {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let range = read_zset(ctx, &self.key, vec![], |zset| {
            zset.range_by_rank(self.start, self.stop)
        })?;
        Ok((
            format_zrange_response(range, self.with_scores),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for ZRange {
    fn name(&self) -> &'static str {
        "zrange"
    }
    fn arity(&self) -> i64 {
        -4
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
        let mut args = vec![
            self.key.clone(),
            self.start.to_string().into(),
            self.stop.to_string().into(),
        ];
        if self.with_scores {
            args.push("WITHSCORES".into());
        }
        args
    }
}

/// `ZREVRANGE key start stop [WITHSCORES]`, descending by score.
#[derive(Debug, Clone, Default)]
pub struct ZRevRange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
    pub with_scores: bool,
}

impl ParseCommand for ZRevRange {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, start, stop, with_scores) = parse_rank_range(args, "ZREVRANGE")?;
        Ok(ZRevRange {
            key,
            start,
            stop,
            with_scores,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZRevRange {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let range = read_zset(ctx, &self.key, vec![], |zset| {
            zset.rev_range_by_rank(self.start, self.stop)
        })?;
        Ok((
            format_zrange_response(range, self.with_scores),
            WriteOutcome::DidNotWrite,
        ))
    }
}

impl CommandSpec for ZRevRange {
    fn name(&self) -> &'static str {
        "zrevrange"
    }
    fn arity(&self) -> i64 {
        -4
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
        let mut args = vec![
            self.key.clone(),
            self.start.to_string().into(),
            self.stop.to_string().into(),
        ];
        if self.with_scores {
            args.push("WITHSCORES".into());
        }
        args
    }
}
