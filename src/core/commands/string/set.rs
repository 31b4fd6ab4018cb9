// src/core/commands/string/set.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{ArgParser, extract_bytes};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{DataValue, ValueCell, unix_millis};
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Defines the condition for `SET` execution (`NX` or `XX`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SetCondition {
    #[default]
    None,
    /// `XX`: only set if the key already exists.
    IfExists,
    /// `NX`: only set if the key does not already exist.
    IfNotExists,
}

/// Defines the TTL options for the `SET` command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TtlOption {
    /// No TTL option was provided; any existing TTL is removed.
    #[default]
    None,
    Seconds(i64),
    Milliseconds(i64),
    UnixSeconds(i64),
    UnixMilliseconds(i64),
    /// `KEEPTTL`
    KeepExisting,
}

impl TtlOption {
    /// Resolves the option to an absolute deadline. `Ok(None)` clears the expiry;
    /// `KEEPTTL` is resolved against the existing cell by the caller.
    fn deadline(&self) -> Result<Option<u64>, CaradeError> {
        let now = unix_millis() as i64;
        let at = match *self {
            TtlOption::None | TtlOption::KeepExisting => return Ok(None),
            TtlOption::Seconds(s) if s > 0 => s.checked_mul(1000).and_then(|ms| now.checked_add(ms)),
            TtlOption::Milliseconds(ms) if ms > 0 => now.checked_add(ms),
            TtlOption::UnixSeconds(s) if s > 0 => s.checked_mul(1000),
            TtlOption::UnixMilliseconds(ms) if ms > 0 => Some(ms),
            _ => None,
        };
        at.map(|at| Some(at as u64)).ok_or_else(|| {
            CaradeError::InvalidRequest("invalid expire time in 'set' command".into())
        })
    }
}

/// Represents the full `SET` command with all its options.
#[derive(Debug, Clone, Default)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub ttl: TtlOption,
    pub condition: SetCondition,
    /// `GET` option to return the old value.
    pub get: bool,
}

impl ParseCommand for Set {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        if args.len() < 2 {
            return Err(CaradeError::WrongArgumentCount("SET".to_string()));
        }
        let mut cmd = Set {
            key: extract_bytes(&args[0])?,
            value: extract_bytes(&args[1])?,
            ..Default::default()
        };

        let mut parser = ArgParser::new(&args[2..]);
        let mut ttl_option_count = 0;

        loop {
            if let Some(seconds) = parser.match_option("ex")? {
                cmd.ttl = TtlOption::Seconds(seconds);
                ttl_option_count += 1;
            } else if let Some(ms) = parser.match_option("px")? {
                cmd.ttl = TtlOption::Milliseconds(ms);
                ttl_option_count += 1;
            } else if let Some(ts_secs) = parser.match_option("exat")? {
                cmd.ttl = TtlOption::UnixSeconds(ts_secs);
                ttl_option_count += 1;
            } else if let Some(ts_ms) = parser.match_option("pxat")? {
                cmd.ttl = TtlOption::UnixMilliseconds(ts_ms);
                ttl_option_count += 1;
            } else if parser.match_flag("keepttl") {
                cmd.ttl = TtlOption::KeepExisting;
                ttl_option_count += 1;
            } else if parser.match_flag("nx") {
                if cmd.condition != SetCondition::None {
                    return Err(CaradeError::SyntaxError);
                }
                cmd.condition = SetCondition::IfNotExists;
            } else if parser.match_flag("xx") {
                if cmd.condition != SetCondition::None {
                    return Err(CaradeError::SyntaxError);
                }
                cmd.condition = SetCondition::IfExists;
            } else if parser.match_flag("get") {
                cmd.get = true;
            } else {
                break;
            }
        }

        if ttl_option_count > 1 {
            return Err(CaradeError::SyntaxError);
        }
        if !parser.remaining_args().is_empty() {
            return Err(CaradeError::SyntaxError);
        }
        Ok(cmd)
    }
}

/// The record a string write is logged as: `SET key value [PXAT deadline]`.
pub fn canonical_set(key: &Bytes, value: &Bytes, expire_at: Option<u64>) -> Vec<Bytes> {
    let mut args = vec![Bytes::from_static(b"SET"), key.clone(), value.clone()];
    if let Some(at) = expire_at {
        args.push(Bytes::from_static(b"PXAT"));
        args.push(Bytes::from(at.to_string()));
    }
    args
}

#[async_trait]
impl ExecutableCommand for Set {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let deadline = self.ttl.deadline()?;
        let clock = ctx.state.keyspace.now();
        let key = &self.key;

        let (written, old_value) = ctx.compute(key, |slot, fx| {
            let old_value = match slot.as_ref().map(|c| &c.data) {
                Some(DataValue::String(s)) => Some(s.clone()),
                Some(_) if self.get => return Err(CaradeError::WrongType),
                _ => None,
            };
            let exists = slot.is_some();
            match self.condition {
                SetCondition::IfNotExists if exists => return Ok((false, old_value)),
                SetCondition::IfExists if !exists => return Ok((false, old_value)),
                _ => {}
            }

            let expire_at = if self.ttl == TtlOption::KeepExisting {
                slot.as_ref().and_then(|c| c.expire_at)
            } else {
                deadline
            };
            if expire_at.is_some_and(|at| at <= clock) {
                if slot.take().is_some() {
                    fx.propagate(key, vec![Bytes::from_static(b"DEL"), key.clone()]);
                }
                return Ok((true, old_value));
            }

            *slot = Some(
                ValueCell::new(DataValue::String(self.value.clone())).with_expiry(expire_at),
            );
            fx.propagate(key, canonical_set(key, &self.value, expire_at));
            Ok((true, old_value))
        })?;

        let outcome = if written {
            WriteOutcome::Write { keys_modified: 1 }
        } else {
            WriteOutcome::DidNotWrite
        };
        let resp = if self.get {
            old_value.map_or(RespValue::Null, RespValue::BulkString)
        } else if written {
            RespValue::ok()
        } else {
            RespValue::Null
        };
        Ok((resp, outcome))
    }
}

impl CommandSpec for Set {
    fn name(&self) -> &'static str {
        "set"
    }
    fn arity(&self) -> i64 {
        -3
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
        let mut args = vec![self.key.clone(), self.value.clone()];
        match self.ttl {
            TtlOption::Seconds(s) => args.extend(["EX".into(), s.to_string().into()]),
            TtlOption::Milliseconds(ms) => args.extend(["PX".into(), ms.to_string().into()]),
            TtlOption::UnixSeconds(s) => args.extend(["EXAT".into(), s.to_string().into()]),
            TtlOption::UnixMilliseconds(ms) => {
                args.extend(["PXAT".into(), ms.to_string().into()])
            }
            TtlOption::KeepExisting => args.push("KEEPTTL".into()),
            TtlOption::None => {}
        }
        match self.condition {
            SetCondition::IfNotExists => args.push("NX".into()),
            SetCondition::IfExists => args.push("XX".into()),
            SetCondition::None => {}
        }
        if self.get {
            args.push("GET".into());
        }
        args
    }
}
