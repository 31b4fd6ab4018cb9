// src/core/commands/hyperloglog/mod.rs

pub mod pfadd;
pub mod pfcount;
pub mod pfmerge;

pub use self::pfadd::PfAdd;
pub use self::pfcount::PfCount;
pub use self::pfmerge::PfMerge;

use crate::core::CaradeError;
use crate::core::storage::ExecutionContext;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::hll::HyperLogLog;
use bytes::Bytes;

/// Folds the sketches at `keys` into one. Missing keys count as empty sketches.
fn union_of(ctx: &mut ExecutionContext, keys: &[Bytes]) -> Result<HyperLogLog, CaradeError> {
    let mut merged = HyperLogLog::new();
    for key in keys {
        ctx.read(key, |cell| match cell.map(|c| &c.data) {
            Some(DataValue::HyperLogLog(hll)) => {
                merged.merge(hll);
                Ok(())
            }
            Some(_) => Err(CaradeError::WrongType),
            None => Ok(()),
        })?;
    }
    Ok(merged)
}
