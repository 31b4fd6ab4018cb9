// src/core/commands/generic/transaction.rs

//! `MULTI`, `EXEC` and `DISCARD`. They only exist as parsed commands: the
//! router owns the per-connection transaction state and acts on them itself.

use crate::core::commands::command_spec::CommandSpec;
use crate::core::commands::command_trait::{
    CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

macro_rules! session_command {
    ($ty:ident, $name:literal, $upper:literal) => {
        #[derive(Debug, Clone, Default)]
        pub struct $ty;

        impl ParseCommand for $ty {
            fn parse(args: &[RespFrame]) -> Result<Self, CaradeError> {
                validate_arg_count(args, 0, $upper)?;
                Ok($ty)
            }
        }

        #[async_trait]
        impl ExecutableCommand for $ty {
            async fn execute(
                &self,
                _ctx: &mut ExecutionContext,
            ) -> Result<(RespValue, WriteOutcome), CaradeError> {
                Err(CaradeError::Internal(
                    concat!($upper, " must be handled by the command router").into(),
                ))
            }
        }

        impl CommandSpec for $ty {
            fn name(&self) -> &'static str {
                $name
            }
            fn arity(&self) -> i64 {
                1
            }
            fn flags(&self) -> CommandFlags {
                CommandFlags::TRANSACTION
            }
            fn first_key(&self) -> i64 {
                0
            }
            fn last_key(&self) -> i64 {
                0
            }
            fn step(&self) -> i64 {
                0
            }
            fn get_keys(&self) -> Vec<Bytes> {
                vec![]
            }
            fn to_resp_args(&self) -> Vec<Bytes> {
                vec![]
            }
        }
    };
}

session_command!(Multi, "multi", "MULTI");
session_command!(Exec, "exec", "EXEC");
session_command!(Discard, "discard", "DISCARD");
