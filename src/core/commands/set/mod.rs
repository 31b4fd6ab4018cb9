// src/core/commands/set/mod.rs

pub mod sadd;
pub mod scard;
pub mod sismember;
pub mod smembers;
pub mod srem;

pub use self::sadd::Sadd;
pub use self::scard::Scard;
pub use self::sismember::Sismember;
pub use self::smembers::Smembers;
pub use self::srem::Srem;
