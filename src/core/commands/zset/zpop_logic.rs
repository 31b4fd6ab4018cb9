// src/core/commands/zset/zpop_logic.rs

use crate::core::blocking::BlockKind;
use crate::core::commands::command_trait::WriteOutcome;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::zset::ZSetEntry;
use crate::core::{CaradeError, RespValue};
use bytes::Bytes;
use std::time::Duration;

/// Defines the side from which to pop elements in a sorted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopSide {
    #[default]
    Min,
    Max,
}

impl PopSide {
    /// The non-blocking command that pops from this side.
    pub fn command_name(self) -> Bytes {
        match self {
            PopSide::Min => Bytes::from_static(b"ZPOPMIN"),
            PopSide::Max => Bytes::from_static(b"ZPOPMAX"),
        }
    }
}

/// Pops up to `count` entries from `key`, logging `log_args` if any were removed.
pub(crate) fn zpop_entries(
    ctx: &mut ExecutionContext,
    key: &Bytes,
    side: PopSide,
    count: usize,
    log_args: Vec<Bytes>,
) -> Result<Vec<ZSetEntry>, CaradeError> {
    ctx.compute(key, |slot, fx| {
        let Some(cell) = slot.as_mut() else {
            return Ok(vec![]);
        };
        let DataValue::SortedSet(zset) = &mut cell.data else {
            return Err(CaradeError::WrongType);
        };
        let popped = match side {
            PopSide::Min => zset.pop_min(count),
            PopSide::Max => zset.pop_max(count),
        };
        if !popped.is_empty() {
            fx.propagate(key, log_args);
        }
        Ok(popped)
    })
}

/// The internal shared logic for `ZPOPMIN` and `ZPOPMAX`.
pub(crate) fn zpop_logic(
    ctx: &mut ExecutionContext,
    key: &Bytes,
    side: PopSide,
    count: Option<usize>,
    log_args: Vec<Bytes>,
) -> Result<(RespValue, WriteOutcome), CaradeError> {
    let popped = zpop_entries(ctx, key, side, count.unwrap_or(1), log_args)?;
    let outcome = if popped.is_empty() {
        WriteOutcome::DidNotWrite
    } else {
        WriteOutcome::Write { keys_modified: 1 }
    };
    let flat = popped
        .into_iter()
        .flat_map(|e| [RespValue::BulkString(e.member), RespValue::from_score(e.score)])
        .collect();
    Ok((RespValue::Array(flat), outcome))
}

/// Shared logic for `BZPOPMIN` and `BZPOPMAX`.
pub(crate) async fn blocking_zpop(
    ctx: &mut ExecutionContext,
    keys: &[Bytes],
    side: PopSide,
    timeout: Option<Duration>,
) -> Result<(RespValue, WriteOutcome), CaradeError> {
    for key in keys {
        let log_args = vec![side.command_name(), key.clone()];
        if let Some(entry) = zpop_entries(ctx, key, side, 1, log_args)?.pop() {
            return Ok((
                RespValue::Array(vec![
                    RespValue::BulkString(key.clone()),
                    RespValue::BulkString(entry.member),
                    RespValue::from_score(entry.score),
                ]),
                WriteOutcome::Write { keys_modified: 1 },
            ));
        }
    }

    let manager = ctx.state.blocker_manager.clone();
    match manager
        .block_on(ctx, keys, BlockKind::ZPop(side), timeout)
        .await?
    {
        Some(woken) => Ok((woken.into_resp(), WriteOutcome::Write { keys_modified: 1 })),
        None => Ok((RespValue::NullArray, WriteOutcome::DidNotWrite)),
    }
}
