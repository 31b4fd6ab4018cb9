// src/core/commands/generic/restore.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::{ArgParser, extract_bytes, parse_i64, validate_min_args};
use crate::core::persistence::value_codec;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{ValueCell, unix_millis};
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// `RESTORE key ttl payload [REPLACE] [ABSTTL]`
#[derive(Debug, Clone, Default)]
pub struct Restore {
    pub key: Bytes,
    pub ttl_ms: u64,
    pub payload: Bytes,
    pub replace: bool,
    pub absttl: bool,
}

impl ParseCommand for Restore {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        validate_min_args(args, 3, "RESTORE")?;
        let ttl = parse_i64(&args[1])?;
        if ttl < 0 {
            return Err(CaradeError::InvalidRequest(
                "Invalid TTL value, must be >= 0".into(),
            ));
        }
        let mut cmd = Restore {
            key: extract_bytes(&args[0])?,
            ttl_ms: ttl as u64,
            payload: extract_bytes(&args[2])?,
            ..Default::default()
        };
        let mut parser = ArgParser::new(&args[3..]);
        while !parser.is_exhausted() {
            if parser.match_flag("replace") {
                cmd.replace = true;
            } else if parser.match_flag("absttl") {
                cmd.absttl = true;
            } else {
                return Err(CaradeError::SyntaxError);
            }
        }
        Ok(cmd)
    }
}

#[async_trait]
impl ExecutableCommand for Restore {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let data = value_codec::restore(&self.payload)?;
        let expire_at = match self.ttl_ms {
            0 => None,
            ttl if self.absttl => Some(ttl),
            ttl => Some(unix_millis().saturating_add(ttl)),
        };
        let now = ctx.state.keyspace.now();

        // Logged with an absolute deadline and REPLACE, so replay is unconditional.
        let mut log_args = vec![
            Bytes::from_static(b"RESTORE"),
            self.key.clone(),
            Bytes::from(expire_at.unwrap_or(0).to_string()),
            self.payload.clone(),
            Bytes::from_static(b"REPLACE"),
        ];
        if expire_at.is_some() {
            log_args.push(Bytes::from_static(b"ABSTTL"));
        }

        let key = &self.key;
        let replace = self.replace;
        ctx.compute(key, |slot, fx| {
            if slot.is_some() && !replace {
                return Err(CaradeError::BusyKey);
            }
            if expire_at.is_some_and(|at| at <= now) {
                if slot.take().is_some() {
                    fx.propagate(key, vec![Bytes::from_static(b"DEL"), key.clone()]);
                }
                return Ok(());
            }
            *slot = Some(ValueCell::new(data).with_expiry(expire_at));
            fx.propagate(key, log_args);
            Ok(())
        })?;
        Ok((RespValue::ok(), WriteOutcome::Write { keys_modified: 1 }))
    }
}

impl CommandSpec for Restore {
    fn name(&self) -> &'static str {
        "restore"
    }
    fn arity(&self) -> i64 {
        -4
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
        let mut args = vec![
            self.key.clone(),
            self.ttl_ms.to_string().into(),
            self.payload.clone(),
        ];
        if self.replace {
            args.push("REPLACE".into());
        }
        if self.absttl {
            args.push("ABSTTL".into());
        }
        args
    }
}
