// src/core/commands/zset/helpers.rs

use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::zset::{ScoreBoundary, SortedSet, ZSetEntry};
use crate::core::{CaradeError, RespValue};
use crate::core::protocol::format_score;
use bytes::Bytes;

/// Runs `f` over the sorted set at `key`, or returns `missing` when there is none.
pub(super) fn read_zset<R>(
    ctx: &mut ExecutionContext,
    key: &Bytes,
    missing: R,
    f: impl FnOnce(&SortedSet) -> R,
) -> Result<R, CaradeError> {
    ctx.read(key, |cell| match cell.map(|c| &c.data) {
        Some(DataValue::SortedSet(zset)) => Ok(f(zset)),
        Some(_) => Err(CaradeError::WrongType),
        None => Ok(missing),
    })
}

/// Formats a range reply: members, or member/score pairs flattened.
pub(super) fn format_zrange_response(range: Vec<ZSetEntry>, with_scores: bool) -> RespValue {
    let mut response = Vec::with_capacity(range.len() * if with_scores { 2 } else { 1 });
    for entry in range {
        response.push(RespValue::BulkString(entry.member));
        if with_scores {
            response.push(RespValue::from_score(entry.score));
        }
    }
    RespValue::Array(response)
}

/// The argument form of a score bound, `(` marking an exclusive one.
pub(super) fn format_score_boundary(bound: &ScoreBoundary) -> Bytes {
    match bound {
        ScoreBoundary::Inclusive(v) => format_score(*v),
        ScoreBoundary::Exclusive(v) => {
            let mut s = b"(".to_vec();
            s.extend_from_slice(&format_score(*v));
            Bytes::from(s)
        }
    }
}
