// src/core/commands/generic/mod.rs

//! Connection, server, keyspace and transaction commands.

pub mod bgrewriteaof;
pub mod dbsize;
pub mod del;
pub mod dump;
pub mod echo;
pub mod exists;
pub mod expire;
pub mod expire_variants;
pub mod flushall;
pub mod flushdb;
pub mod keys;
pub mod persist;
pub mod ping;
pub mod pttl;
pub mod quit;
pub mod rename;
pub mod restore;
pub mod select;
pub mod transaction;
pub mod ttl;
pub mod type_cmd;
pub mod unwatch;
pub mod watch;

pub use self::bgrewriteaof::BgRewriteAof;
pub use self::dbsize::DbSize;
pub use self::del::Del;
pub use self::dump::Dump;
pub use self::echo::Echo;
pub use self::exists::Exists;
pub use self::expire::Expire;
pub use self::expire_variants::{ExpireAt, PExpire, PExpireAt};
pub use self::flushall::FlushAll;
pub use self::flushdb::FlushDb;
pub use self::keys::Keys;
pub use self::persist::Persist;
pub use self::ping::Ping;
pub use self::pttl::Pttl;
pub use self::quit::Quit;
pub use self::rename::Rename;
pub use self::restore::Restore;
pub use self::select::Select;
pub use self::transaction::{Discard, Exec, Multi};
pub use self::ttl::Ttl;
pub use self::type_cmd::TypeInfo;
pub use self::unwatch::Unwatch;
pub use self::watch::Watch;
