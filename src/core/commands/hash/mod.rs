// src/core/commands/hash/mod.rs

pub mod hdel;
pub mod hget;
pub mod hgetall;
pub mod hlen;
pub mod hset;

pub use self::hdel::HDel;
pub use self::hget::HGet;
pub use self::hgetall::HGetAll;
pub use self::hlen::HLen;
pub use self::hset::HSet;
