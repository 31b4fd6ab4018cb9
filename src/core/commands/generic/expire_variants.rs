// src/core/commands/generic/expire_variants.rs

//! `PEXPIRE`, `EXPIREAT` and `PEXPIREAT`, plus the shared expiry update.
//!
//! Every variant resolves to an absolute unix-millisecond deadline and is logged
//! as `PEXPIREAT`, so replaying the log later yields the same deadline.

use super::expire::invalid_expire;
use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{extract_bytes, parse_i64, validate_arg_count};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::unix_millis;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `now + millis`, or `None` if it does not fit.
pub(super) fn deadline_after(millis: i64) -> Option<i64> {
    (unix_millis() as i64).checked_add(millis)
}

/// Applies an absolute deadline to `key`. A deadline that has already passed
/// deletes the key and logs `DEL` instead.
pub(super) fn set_expiry(
    ctx: &mut ExecutionContext,
    key: &Bytes,
    deadline_ms: i64,
) -> Result<(RespValue, WriteOutcome), CaradeError> {
    let now = ctx.state.keyspace.now() as i64;
    let applied = ctx.compute(key, |slot, fx| {
        let Some(cell) = slot.as_mut() else {
            return Ok(false);
        };
        if deadline_ms <= now {
            *slot = None;
            fx.propagate(key, vec![Bytes::from_static(b"DEL"), key.clone()]);
        } else {
            cell.expire_at = Some(deadline_ms as u64);
            fx.propagate(
                key,
                vec![
                    Bytes::from_static(b"PEXPIREAT"),
                    key.clone(),
                    Bytes::from(deadline_ms.to_string()),
                ],
            );
        }
        Ok(true)
    })?;

    if !applied {
        return Ok((RespValue::Integer(0), WriteOutcome::DidNotWrite));
    }
    let outcome = if deadline_ms <= now {
        WriteOutcome::Delete { keys_deleted: 1 }
    } else {
        WriteOutcome::Write { keys_modified: 1 }
    };
    Ok((RespValue::Integer(1), outcome))
}

fn parse_key_and_time(args: &[RespFrame], cmd: &str) -> Result<(Bytes, i64), CaradeError> {
    validate_arg_count(args, 2, cmd)?;
    Ok((extract_bytes(&args[0])?, parse_i64(&args[1])?))
}

#[derive(Debug, Clone, Default)]
pub struct PExpire {
    pub key: Bytes,
    pub milliseconds: i64,
}
impl ParseCommand for PExpire {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, milliseconds) = parse_key_and_time(args, "PEXPIRE")?;
        Ok(PExpire { key, milliseconds })
    }
}
#[async_trait]
impl ExecutableCommand for PExpire {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let deadline =
            deadline_after(self.milliseconds).ok_or_else(|| invalid_expire("pexpire"))?;
        set_expiry(ctx, &self.key, deadline)
    }
}
impl CommandSpec for PExpire {
    fn name(&self) -> &'static str {
        "pexpire"
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
        vec![self.key.clone(), self.milliseconds.to_string().into()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpireAt {
    pub key: Bytes,
    pub timestamp: i64,
}
impl ParseCommand for ExpireAt {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, timestamp) = parse_key_and_time(args, "EXPIREAT")?;
        Ok(ExpireAt { key, timestamp })
    }
}
#[async_trait]
impl ExecutableCommand for ExpireAt {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let deadline = self
            .timestamp
            .checked_mul(1000)
            .ok_or_else(|| invalid_expire("expireat"))?;
        set_expiry(ctx, &self.key, deadline)
    }
}
impl CommandSpec for ExpireAt {
    fn name(&self) -> &'static str {
        "expireat"
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
        vec![self.key.clone(), self.timestamp.to_string().into()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct PExpireAt {
    pub key: Bytes,
    pub timestamp_ms: i64,
}
impl ParseCommand for PExpireAt {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, timestamp_ms) = parse_key_and_time(args, "PEXPIREAT")?;
        Ok(PExpireAt { key, timestamp_ms })
    }
}
#[async_trait]
impl ExecutableCommand for PExpireAt {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        set_expiry(ctx, &self.key, self.timestamp_ms)
    }
}
impl CommandSpec for PExpireAt {
    fn name(&self) -> &'static str {
        "pexpireat"
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
        vec![self.key.clone(), self.timestamp_ms.to_string().into()]
    }
}
