// src/core/commands/zset/mod.rs

mod helpers;
pub mod zpop_logic;

pub mod bzpopmax;
pub mod bzpopmin;
pub mod zadd;
pub mod zcard;
pub mod zincrby;
pub mod zpopmax;
pub mod zpopmin;
pub mod zrange;
pub mod zrangebyscore;
pub mod zrank;
pub mod zrem;
pub mod zscore;

pub use self::bzpopmax::BZPopMax;
pub use self::bzpopmin::BZPopMin;
pub use self::zadd::Zadd;
pub use self::zcard::ZCard;
pub use self::zincrby::ZIncrBy;
pub use self::zpopmax::ZPopMax;
pub use self::zpopmin::ZPopMin;
pub use self::zrange::{ZRange, ZRevRange};
pub use self::zrangebyscore::ZRangeByScore;
pub use self::zrank::ZRank;
pub use self::zrem::ZRem;
pub use self::zscore::ZScore;
