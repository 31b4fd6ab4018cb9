// src/core/commands/hyperloglog/pfmerge.rs

use super::union_of;
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

/// `PFMERGE destkey [sourcekey ...]`. The destination's own registers take part in the union.
#[derive(Debug, Clone, Default)]
pub struct PfMerge {
    pub dest_key: Bytes,
    pub source_keys: Vec<Bytes>,
}

impl ParseCommand for PfMerge {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        let (dest_key, source_keys) = parse_key_and_values(args, 1, "PFMERGE")?;
        Ok(PfMerge {
            dest_key,
            source_keys,
        })
    }
}

#[async_trait]
impl ExecutableCommand for PfMerge {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        let sources = union_of(ctx, &self.source_keys)?;
        ctx.compute(&self.dest_key, |slot, fx| {
            let cell = slot.get_or_insert_with(|| {
                ValueCell::new(DataValue::HyperLogLog(Box::default()))
            });
            let DataValue::HyperLogLog(hll) = &mut cell.data else {
                return Err(CaradeError::WrongType);
            };
            hll.merge(&sources);
            fx.touch(&self.dest_key);
            Ok(())
        })?;
        ctx.log(self.to_log_args());
        Ok((
            RespValue::ok(),
            WriteOutcome::Write { keys_modified: 1 },
        ))
    }
}

impl CommandSpec for PfMerge {
    fn name(&self) -> &'static str {
        "pfmerge"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::WRITE | CommandFlags::DENY_OOM | CommandFlags::EXCLUSIVE
    }
    fn first_key(&self) -> i64 {
        1
    }
    fn last_key(&self) -> i64 {
        -1
    }
    fn step(&self) -> i64 {
        1
    }
    fn get_keys(&self) -> Vec<Bytes> {
        let mut keys = vec![self.dest_key.clone()];
        keys.extend(self.source_keys.iter().cloned());
        keys
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![self.dest_key.clone()];
        args.extend(self.source_keys.iter().cloned());
        args
    }
}
