// src/core/commands/list/lpop.rs

use super::logic::{Side, list_pop_logic};
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

/// `LPOP key [count]`
#[derive(Debug, Clone, Default)]
pub struct LPop {
    pub key: Bytes,
    pub count: Option<usize>,
}

impl ParseCommand for LPop {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        if args.is_empty() || args.len() > 2 {
            return Err(CaradeError::WrongArgumentCount("LPOP".to_string()));
        }
        let count = match args.get(1) {
            Some(frame) => {
                let n = parse_i64(frame)?;
                if n < 0 {
                    return Err(CaradeError::InvalidRequest(
                        "value is out of range, must be positive".into(),
                    ));
                }
                Some(n as usize)
            }
            None => None,
        };
        Ok(LPop {
            key: extract_bytes(&args[0])?,
            count,
        })
    }
}

#[async_trait]
impl ExecutableCommand for LPop {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let popped = list_pop_logic(
            ctx,
            &self.key,
            Side::Left,
            self.count.unwrap_or(1),
            self.to_log_args(),
        )?;
        let outcome = match &popped {
            Some(values) if !values.is_empty() => WriteOutcome::Write { keys_modified: 1 },
            _ => WriteOutcome::DidNotWrite,
        };
        let resp = match (popped, self.count) {
            (None, None) => RespValue::Null,
            (None, Some(_)) => RespValue::NullArray,
            (Some(mut values), None) => values.pop().map_or(RespValue::Null, RespValue::BulkString),
            (Some(values), Some(_)) => {
                RespValue::Array(values.into_iter().map(RespValue::BulkString).collect())
            }
        };
        Ok((resp, outcome))
    }
}

impl CommandSpec for LPop {
    fn name(&self) -> &'static str {
        "lpop"
    }
    fn arity(&self) -> i64 {
        -2
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
        let mut args = vec![self.key.clone()];
        if let Some(count) = self.count {
            args.push(count.to_string().into());
        }
        args
    }
}
