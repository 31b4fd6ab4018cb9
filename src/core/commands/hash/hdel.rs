// src/core/commands/hash/hdel.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::parse_key_and_values;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::DataValue;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct HDel {
    pub key: Bytes,
    pub fields: Vec<Bytes>,
}

impl ParseCommand for HDel {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, fields) = parse_key_and_values(args, 2, "HDEL")?;
        Ok(HDel { key, fields })
    }
}

#[async_trait]
impl ExecutableCommand for HDel {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let log_args = self.to_log_args();
        let removed = ctx.compute(&self.key, |slot, fx| {
            let Some(cell) = slot.as_mut() else {
                return Ok(0);
            };
            let DataValue::Hash(hash) = &mut cell.data else {
                return Err(CaradeError::WrongType);
            };
            // shift_remove keeps the remaining fields in insertion order.
            let removed = self
                .fields
                .iter()
                .filter(|field| hash.shift_remove(*field).is_some())
                .count();
            if removed > 0 {
                fx.propagate(&self.key, log_args);
            }
            Ok(removed)
        })?;
        let outcome = if removed > 0 {
            WriteOutcome::Write { keys_modified: 1 }
        } else {
            WriteOutcome::DidNotWrite
        };
        Ok((RespValue::Integer(removed as i64), outcome))
    }
}

impl CommandSpec for HDel {
    fn name(&self) -> &'static str {
        "hdel"
    }
    fn arity(&self) -> i64 {
        -3
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
        args.extend(self.fields.iter().cloned());
        args
    }
}
