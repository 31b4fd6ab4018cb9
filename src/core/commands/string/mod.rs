// src/core/commands/string/mod.rs

pub mod decrby;
pub mod get;
pub mod incr;
pub mod incrby;
pub mod mset;
pub mod set;

pub use self::decrby::DecrBy;
pub use self::get::Get;
pub use self::incr::{Decr, Incr};
pub use self::incrby::IncrBy;
pub use self::mset::MSet;
pub use self::set::Set;
