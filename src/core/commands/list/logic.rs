// src/core/commands/list/logic.rs

use crate::core::blocking::BlockKind;
use crate::core::commands::command_trait::WriteOutcome;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::{DataValue, ValueCell};
use crate::core::{CaradeError, RespValue};
use bytes::Bytes;
use std::collections::VecDeque;
use std::time::Duration;
use strum_macros::{Display, EnumString};

/// An end of a list, as named by `LMOVE`/`BLMOVE` (`LEFT` or `RIGHT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    pub fn pop(self, list: &mut VecDeque<Bytes>) -> Option<Bytes> {
        match self {
            Side::Left => list.pop_front(),
            Side::Right => list.pop_back(),
        }
    }

    pub fn push(self, list: &mut VecDeque<Bytes>, value: Bytes) {
        match self {
            Side::Left => list.push_front(value),
            Side::Right => list.push_back(value),
        }
    }

    /// The single-element pop that removes from this end.
    pub fn pop_command(self) -> Bytes {
        match self {
            Side::Left => Bytes::from_static(b"LPOP"),
            Side::Right => Bytes::from_static(b"RPOP"),
        }
    }

    pub fn as_bytes(self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

fn list_mut(cell: &mut ValueCell) -> Result<&mut VecDeque<Bytes>, CaradeError> {
    match &mut cell.data {
        DataValue::List(list) => Ok(list),
        _ => Err(CaradeError::WrongType),
    }
}

/// Shared logic for `LPUSH` and `RPUSH`. Replies with the new length.
pub(crate) fn list_push_logic(
    ctx: &mut ExecutionContext,
    key: &Bytes,
    values: &[Bytes],
    side: Side,
    log_args: Vec<Bytes>,
) -> Result<(RespValue, WriteOutcome), CaradeError> {
    let len = ctx.compute(key, |slot, fx| {
        let cell = slot.get_or_insert_with(|| ValueCell::new(DataValue::List(VecDeque::new())));
        let list = list_mut(cell)?;
        for value in values {
            side.push(list, value.clone());
        }
        let len = list.len();
        fx.propagate(key, log_args);
        Ok(len)
    })?;
    Ok((
        RespValue::Integer(len as i64),
        WriteOutcome::Write { keys_modified: 1 },
    ))
}

/// Removes up to `count` elements from one end of `key`, logging `log_args`
/// if anything was removed. `None` means the key does not exist.
pub(crate) fn list_pop_logic(
    ctx: &mut ExecutionContext,
    key: &Bytes,
    side: Side,
    count: usize,
    log_args: Vec<Bytes>,
) -> Result<Option<Vec<Bytes>>, CaradeError> {
    ctx.compute(key, |slot, fx| {
        let Some(cell) = slot.as_mut() else {
            return Ok(None);
        };
        let list = list_mut(cell)?;
        let popped: Vec<Bytes> = (0..count).map_while(|_| side.pop(list)).collect();
        if !popped.is_empty() {
            fx.propagate(key, log_args);
        }
        Ok(Some(popped))
    })
}

/// Pops one element from `source` and pushes it onto `destination`.
///
/// Callers hold the gate exclusively. Both keys are type-checked before
/// anything changes. The move is logged as `LMOVE` whichever command ran it.
pub(crate) fn list_move_logic(
    ctx: &mut ExecutionContext,
    source: &Bytes,
    destination: &Bytes,
    from: Side,
    to: Side,
) -> Result<Option<Bytes>, CaradeError> {
    let source_has_data = ctx.read(source, |cell| match cell.map(|c| &c.data) {
        Some(DataValue::List(list)) => Ok(!list.is_empty()),
        Some(_) => Err(CaradeError::WrongType),
        None => Ok(false),
    })?;
    if !source_has_data {
        return Ok(None);
    }
    ctx.read(destination, |cell| match cell.map(|c| &c.data) {
        Some(DataValue::List(_)) | None => Ok(()),
        Some(_) => Err(CaradeError::WrongType),
    })?;

    let popped = ctx.compute(source, |slot, fx| {
        let popped = match slot.as_mut() {
            Some(cell) => from.pop(list_mut(cell)?),
            None => None,
        };
        if popped.is_some() {
            fx.touch(source);
        }
        Ok(popped)
    })?;
    let Some(value) = popped else {
        return Ok(None);
    };

    ctx.compute(destination, |slot, fx| {
        let cell = slot.get_or_insert_with(|| ValueCell::new(DataValue::List(VecDeque::new())));
        to.push(list_mut(cell)?, value.clone());
        fx.touch(destination);
        Ok(())
    })?;
    ctx.log(vec![
        Bytes::from_static(b"LMOVE"),
        source.clone(),
        destination.clone(),
        from.as_bytes(),
        to.as_bytes(),
    ]);
    Ok(Some(value))
}

/// Shared logic for `BLPOP` and `BRPOP`.
pub(crate) async fn blocking_pop(
    ctx: &mut ExecutionContext,
    keys: &[Bytes],
    side: Side,
    timeout: Option<Duration>,
) -> Result<(RespValue, WriteOutcome), CaradeError> {
    for key in keys {
        let log_args = vec![side.pop_command(), key.clone()];
        if let Some(mut popped) = list_pop_logic(ctx, key, side, 1, log_args)?
            && let Some(value) = popped.pop()
        {
            return Ok((
                RespValue::Array(vec![
                    RespValue::BulkString(key.clone()),
                    RespValue::BulkString(value),
                ]),
                WriteOutcome::Write { keys_modified: 1 },
            ));
        }
    }

    let manager = ctx.state.blocker_manager.clone();
    match manager
        .block_on(ctx, keys, BlockKind::Pop(side), timeout)
        .await?
    {
        Some(woken) => Ok((woken.into_resp(), WriteOutcome::Write { keys_modified: 1 })),
        None => Ok((RespValue::NullArray, WriteOutcome::DidNotWrite)),
    }
}

/// Shared logic for `BLMOVE` and `BRPOPLPUSH`.
pub(crate) async fn blocking_move(
    ctx: &mut ExecutionContext,
    source: &Bytes,
    destination: &Bytes,
    from: Side,
    to: Side,
    timeout: Option<Duration>,
) -> Result<(RespValue, WriteOutcome), CaradeError> {
    if let Some(value) = list_move_logic(ctx, source, destination, from, to)? {
        return Ok((
            RespValue::BulkString(value),
            WriteOutcome::Write { keys_modified: 2 },
        ));
    }

    let kind = BlockKind::Move {
        target: destination.clone(),
        from,
        to,
    };
    let manager = ctx.state.blocker_manager.clone();
    match manager
        .block_on(ctx, std::slice::from_ref(source), kind, timeout)
        .await?
    {
        Some(woken) => Ok((woken.into_resp(), WriteOutcome::Write { keys_modified: 2 })),
        None => Ok((RespValue::Null, WriteOutcome::DidNotWrite)),
    }
}
