// src/core/commands/generic/watch.rs

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::parse_keys;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, Clone, Default)]
pub struct Watch {
    pub keys: Vec<Bytes>,
}

impl ParseCommand for Watch {
    fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
        Ok(Watch {
            keys: parse_keys(args, "WATCH")?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for Watch {
    async fn execute(
        &self,
        _ctx: &mut ExecutionContext,
    ) -> Result<(RespValue, WriteOutcome), CaradeError> {
        // The session's watch set lives in the router, which handles WATCH directly.
        Err(CaradeError::Internal(
            "WATCH must be handled by the command router".into(),
        ))
    }
}

impl CommandSpec for Watch {
    fn name(&self) -> &'static str {
        "watch"
    }
    fn arity(&self) -> i64 {
        -2
    }
    fn flags(&self) -> CommandFlags {
        CommandFlags::TRANSACTION | CommandFlags::READONLY
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
        self.keys.clone()
    }
    fn to_resp_args(&self) -> Vec<Bytes> {
        self.keys.clone()
    }
}
