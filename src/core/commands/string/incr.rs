// src/core/commands/string/incr.rs

use super::set::canonical_set;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{DataValue, ValueCell};
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Shared logic for INCR, DECR, INCRBY and DECRBY.
///
/// The result is logged as a plain `SET` that keeps the key's deadline, so
/// replay does not depend on the value the key held before.
pub fn do_incr_decr_by(
    key: &Bytes,
    by: i64,
    ctx: &mut ExecutionContext,
) -> Result<(RespValue, WriteOutcome), CaradeError> {
    let new_val = ctx.compute(key, |slot, fx| {
        let (current, expire_at) = match slot.as_ref() {
            Some(cell) => match &cell.data {
                DataValue::String(s) => (parse_integer(s)?, cell.expire_at),
                _ => return Err(CaradeError::WrongType),
            },
            None => (0, None),
        };
        let new_val = current.checked_add(by).ok_or(CaradeError::Overflow)?;
        let value = Bytes::from(new_val.to_string());
        *slot = Some(ValueCell::new(DataValue::String(value.clone())).with_expiry(expire_at));
        fx.propagate(key, canonical_set(key, &value, expire_at));
        Ok(new_val)
    })?;
    Ok((
        RespValue::Integer(new_val),
        WriteOutcome::Write { keys_modified: 1 },
    ))
}

fn parse_integer(s: &Bytes) -> Result<i64, CaradeError> {
    std::str::from_utf8(s)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(CaradeError::NotAnInteger)
}

/// Represents the `INCR` command.
#[derive(Debug, Clone, Default)]
pub struct Incr {
    pub key: Bytes,
}

impl ParseCommand for Incr {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 1, "INCR")?;
        Ok(Incr {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Incr {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        do_incr_decr_by(&self.key, 1, ctx)
    }
}

impl CommandSpec for Incr {
    fn name(&self) -> &'static str {
        "incr"
    }
    fn arity(&self) -> i64 {
        2
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
        vec![self.key.clone()]
    }
}

/// Represents the `DECR` command.
#[derive(Debug, Clone, Default)]
pub struct Decr {
    pub key: Bytes,
}

impl ParseCommand for Decr {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_arg_count(args, 1, "DECR")?;
        Ok(Decr {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Decr {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        do_incr_decr_by(&self.key, -1, ctx)
    }
}

impl CommandSpec for Decr {
    fn name(&self) -> &'static str {
        "decr"
    }
    fn arity(&self) -> i64 {
        2
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
        vec![self.key.clone()]
    }
}
