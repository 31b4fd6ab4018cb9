// src/core/commands/mod.rs

//! This module defines all supported commands, organizes them into categories,
//! and provides the central `Command` enum that encapsulates their parsed state.
//! The `define_commands!` macro is used to generate the enum and its core
//! implementations, reducing boilerplate and ensuring consistency.

use crate::core::commands::command_trait::{
    CommandExt, CommandFlags, ExecutableCommand, ParseCommand, WriteOutcome,
};
use crate::core::protocol::RespFrame;
use crate::core::storage::ExecutionContext;
use crate::core::{CaradeError, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use std::collections::HashMap;

// Re-export the CommandSpec trait for easy access by other modules.
pub use command_spec::CommandSpec;

// The macro definition that generates the Command enum and its implementations.
#[macro_use]
mod command_def;

pub mod command_spec;
pub mod command_trait;
pub mod generic;
pub mod hash;
pub mod helpers;
pub mod hyperloglog;
pub mod list;
pub mod set;
pub mod string;
pub mod zset;

define_commands! {
    // --- Connection & Server ---
    (Ping, Ping, generic),
    (Echo, Echo, generic),
    (Select, Select, generic),
    (DbSize, DbSize, generic),
    (Keys, Keys, generic),
    (FlushDb, FlushDb, generic),
    (FlushAll, FlushAll, generic),
    (BgRewriteAof, BgRewriteAof, generic),
    (Quit, Quit, generic),

    // --- Keys ---
    (Del, Del, generic),
    (Exists, Exists, generic),
    (Type, TypeInfo, generic),
    (Rename, Rename, generic),
    (Expire, Expire, generic),
    (PExpire, PExpire, generic),
    (ExpireAt, ExpireAt, generic),
    (PExpireAt, PExpireAt, generic),
    (Persist, Persist, generic),
    (Ttl, Ttl, generic),
    (Pttl, Pttl, generic),
    (Dump, Dump, generic),
    (Restore, Restore, generic),

    // --- Transactions ---
    (Multi, Multi, generic),
    (Exec, Exec, generic),
    (Discard, Discard, generic),
    (Watch, Watch, generic),
    (Unwatch, Unwatch, generic),

    // --- String Commands ---
    (Get, Get, string),
    (Set, Set, string),
    (MSet, MSet, string),
    (Incr, Incr, string),
    (Decr, Decr, string),
    (IncrBy, IncrBy, string),
    (DecrBy, DecrBy, string),

    // --- List Commands ---
    (LPush, LPush, list),
    (RPush, RPush, list),
    (LPop, LPop, list),
    (RPop, RPop, list),
    (LLen, LLen, list),
    (LRange, LRange, list),
    (LMove, LMove, list),
    (RPopLPush, RPopLPush, list),
    (BLPop, BLPop, list),
    (BRPop, BRPop, list),
    (BLMove, BLMove, list),
    (BRPopLPush, BRPopLPush, list),

    // --- Hash Commands ---
    (HSet, HSet, hash),
    (HGet, HGet, hash),
    (HDel, HDel, hash),
    (HGetAll, HGetAll, hash),
    (HLen, HLen, hash),

    // --- Set Commands ---
    (Sadd, Sadd, set),
    (Srem, Srem, set),
    (Smembers, Smembers, set),
    (Sismember, Sismember, set),
    (Scard, Scard, set),

    // --- Sorted Set Commands ---
    (Zadd, Zadd, zset),
    (ZIncrBy, ZIncrBy, zset),
    (ZRem, ZRem, zset),
    (ZScore, ZScore, zset),
    (ZCard, ZCard, zset),
    (ZRank, ZRank, zset),
    (ZRange, ZRange, zset),
    (ZRevRange, ZRevRange, zset),
    (ZRangeByScore, ZRangeByScore, zset),
    (ZPopMin, ZPopMin, zset),
    (ZPopMax, ZPopMax, zset),
    (BZPopMin, BZPopMin, zset),
    (BZPopMax, BZPopMax, zset),

    // --- HyperLogLog Commands ---
    (PfAdd, PfAdd, hyperloglog),
    (PfCount, PfCount, hyperloglog),
    (PfMerge, PfMerge, hyperloglog),
}
