// src/core/commands/zset/zpopmin.rs

use super::zpop_logic::{PopSide, zpop_logic};
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

/// `ZPOPMIN key [count]`
#[derive(Debug, Clone, Default)]
pub struct ZPopMin {
    pub key: Bytes,
    pub count: Option<usize>,
}

impl ParseCommand for ZPopMin {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        if args.is_empty() || args.len() > 2 {
            return Err(CaradeError::WrongArgumentCount("ZPOPMIN".to_string()));
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
        Ok(ZPopMin {
            key: extract_bytes(&args[0])?,
            count,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZPopMin {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        zpop_logic(ctx, &self.key, PopSide::Min, self.count, self.to_log_args())
    }
}

impl CommandSpec for ZPopMin {
    fn name(&self) -> &'static str {
        "zpopmin"
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
