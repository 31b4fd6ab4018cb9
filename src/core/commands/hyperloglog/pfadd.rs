// src/core/commands/hyperloglog/pfadd.rs

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

#[derive(Debug, Clone, Default)]
pub struct PfAdd {
    pub key: Bytes,
    pub elements: Vec<Bytes>,
}

impl ParseCommand for PfAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (key, elements) = parse_key_and_values(args, 1, "PFADD")?;
        Ok(PfAdd { key, elements })
    }
}

#[async_trait]
impl ExecutableCommand for PfAdd {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let log_args = self.to_log_args();
        let changed = ctx.compute(&self.key, |slot, fx| {
            let created = slot.is_none();
            let cell = slot.get_or_insert_with(|| {
                ValueCell::new(DataValue::HyperLogLog(Box::default()))
            });
            let DataValue::HyperLogLog(hll) = &mut cell.data else {
                return Err(CaradeError::WrongType);
            };
            let mut changed = created;
            for element in &self.elements {
                changed |= hll.add(element);
            }
            if changed {
                fx.propagate(&self.key, log_args);
            }
            Ok(changed)
        })?;

        if changed {
            Ok((
                RespValue::Integer(1),
                WriteOutcome::Write { keys_modified: 1 },
            ))
        } else {
            Ok((RespValue::Integer(0), WriteOutcome::DidNotWrite))
        }
    }
}

impl CommandSpec for PfAdd {
    fn name(&self) -> &'static str {
        "pfadd"
    }
    fn arity(&self) -> i64 {
        -2
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
        args.extend(self.elements.iter().cloned());
        args
    }
}
