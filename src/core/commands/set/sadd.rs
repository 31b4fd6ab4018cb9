// src/core/commands/set/sadd.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::parse_key_and_values;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{DataValue, ValueCell};
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Sadd {
    pub key: Bytes,
    pub members: Vec<Bytes>,
}

impl ParseCommand for Sadd {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, members) = parse_key_and_values(args, 2, "SADD")?;
        Ok(Sadd { key, members })
    }
}

#[async_trait]
impl ExecutableCommand for Sadd {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let log_args = self.to_log_args();
        let added = ctx.compute(&self.key, |slot, fx| {
            let cell = slot.get_or_insert_with(|| ValueCell::new(DataValue::Set(HashSet::new())));
            let DataValue::Set(set) = &mut cell.data else {
                return Err(CaradeError::WrongType);
            };
            let added = self
                .members
                .iter()
                .filter(|member| set.insert((*member).clone()))
                .count();
            if added > 0 {
                fx.propagate(&self.key, log_args);
            }
            Ok(added)
        })?;
        let outcome = if added > 0 {
            WriteOutcome::Write { keys_modified: 1 }
        } else {
            WriteOutcome::DidNotWrite
        };
        Ok((RespValue::Integer(added as i64), outcome))
    }
}

impl CommandSpec for Sadd {
    fn name(&self) -> &'static str {
        "sadd"
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
        let mut args = vec![self.key.clone()];
        args.extend(self.members.iter().cloned());
        args
    }
}
