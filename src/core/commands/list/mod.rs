// src/core/commands/list/mod.rs

pub mod blmove;
pub mod blpop;
pub mod brpop;
pub mod llen;
pub mod lmove;
pub mod logic;
pub mod lpop;
pub mod lpush;
pub mod lrange;
pub mod rpop;

pub use self::blmove::{BLMove, BRPopLPush};
pub use self::blpop::BLPop;
pub use self::brpop::BRPop;
pub use self::llen::LLen;
pub use self::lmove::{LMove, RPopLPush};
pub use self::lpop::LPop;
pub use self::lpush::{LPush, RPush};
pub use self::lrange::LRange;
pub use self::rpop::RPop;
