// src/core/commands/zset/zincrby.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, parse_f64, validate_arg_count};
use crate::core::protocol::{RespFrame, format_score};
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{DataValue, ValueCell};
use crate::core::storage::zset::SortedSet;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct ZIncrBy {
    pub key: Bytes,
    pub increment: f64,
    pub member: Bytes,
}

impl ParseCommand for ZIncrBy {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 3, "ZINCRBY")?;
        Ok(ZIncrBy {
            key: extract_bytes(&args[0])?,
            increment: parse_f64(&args[1])?,
            member: extract_bytes(&args[2])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZIncrBy {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let log_args = self.to_log_args();
        let score = ctx.compute(&self.key, |slot, fx| {
            let cell = slot.get_or_insert_with(|| ValueCell::new(DataValue::SortedSet(SortedSet::new())));
            let DataValue::SortedSet(zset) = &mut cell.data else {
                return Err(CaradeError::WrongType);
            };
            let score = zset
                .incr_by(self.increment, self.member.clone())
                .ok_or(CaradeError::NotAFloat)?;
            fx.propagate(&self.key, log_args);
            Ok(score)
        })?;
        Ok((
            RespValue::from_score(score),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}

impl CommandSpec for ZIncrBy {
    fn name(&self) -> &'static str {
        "zincrby"
    }
    fn arity(&self) -> i64 {
        4
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
        vec![
            self.key.clone(),
            format_score(self.increment),
            self.member.clone(),
        ]
    }
}
