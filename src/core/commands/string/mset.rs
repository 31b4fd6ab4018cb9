// src/core/commands/string/mset.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{DataValue, ValueCell};
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct MSet {
    pub pairs: Vec<(Bytes, Bytes)>,
}

impl ParseCommand for MSet {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        if args.is_empty() || args.len() % 2 != 0 {
            return Err(CaradeError::WrongArgumentCount("MSET".to_string()));
        }
        let pairs = args
            .chunks_exact(2)
            .map(|chunk| Ok((extract_bytes(&chunk[0])?, extract_bytes(&chunk[1])?)))
            .collect::<Result<_, CaradeError>>()?;
        Ok(MSet { pairs })
    }
}

/// All pairs land under the exclusive gate, so no reader sees half of them.
#[async_trait]
impl ExecutableCommand for MSet {
    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        for (key, value) in &self.pairs {
            ctx.compute(key, |slot, fx| {
                *slot = Some(ValueCell::new(DataValue::String(value.clone())));
                fx.touch(key);
                Ok(())
            })?;
        }
        ctx.log(self.to_log_args());
        Ok((
            RespValue::ok(),
            WriteOutcome::Write {
                keys_modified: self.pairs.len() as u64,
            },
        ))
    }
}

impl CommandSpec for MSet {
    fn name(&self) -> &'static str {
        "mset"
    }
    fn arity(&self) -> i64 {
        -3
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
        2
    }
    fn get_keys(&self) -> Vec<Bytes> {
        self.pairs.iter().map(|(k, _)| k.clone()).collect()
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        self.pairs
            .iter()
            .flat_map(|(k, v)| [k.clone(), v.clone()])
            .collect()
    }
}
