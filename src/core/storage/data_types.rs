// src/core/storage/data_types.rs

//! The value cell stored under every key, and the typed payloads it can hold.

use super::hll::HyperLogLog;
use super::zset::SortedSet;
use crate::core::persistence::value_codec;
use crate::core::protocol::format_score;
use bytes::Bytes;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

/// Largest accepted string value.
pub const MAX_STRING_SIZE: usize = 512 * 1024 * 1024;

/// Elements per command when a collection is written out during a log rewrite.
pub const REWRITE_CHUNK_SIZE: usize = 50;

/// Current wall-clock time in unix milliseconds.
pub fn unix_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Metadata for the LFU eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LfuInfo {
    /// Minutes since the unix epoch, truncated to 16 bits.
    pub(crate) last_decrement_time: u16,
    /// Logarithmic access counter.
    pub(crate) counter: u8,
}

impl Default for LfuInfo {
    fn default() -> Self {
        Self {
            last_decrement_time: lfu_time_now(),
            counter: LFU_INIT_VAL,
        }
    }
}

/// The typed payload of a key.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    String(Bytes),
    List(VecDeque<Bytes>),
    Hash(IndexMap<Bytes, Bytes>),
    Set(HashSet<Bytes>),
    SortedSet(SortedSet),
    HyperLogLog(Box<HyperLogLog>),
}

impl DataValue {
    pub fn memory_usage(&self) -> usize {
        match self {
            DataValue::String(b) => b.len(),
            DataValue::List(l) => l.iter().map(|b| b.len()).sum(),
            DataValue::Hash(h) => h.iter().map(|(k, v)| k.len() + v.len()).sum(),
            DataValue::Set(s) => s.iter().map(|b| b.len()).sum(),
            DataValue::SortedSet(z) => z.memory_usage(),
            DataValue::HyperLogLog(h) => h.memory_usage(),
        }
    }

    /// Containers with no elements are never kept in the keyspace.
    pub fn is_empty_container(&self) -> bool {
        match self {
            DataValue::List(l) => l.is_empty(),
            DataValue::Hash(h) => h.is_empty(),
            DataValue::Set(s) => s.is_empty(),
            DataValue::SortedSet(z) => z.is_empty(),
            DataValue::String(_) | DataValue::HyperLogLog(_) => false,
        }
    }

    /// The name reported by `TYPE`.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::String(_) | DataValue::HyperLogLog(_) => "string",
            DataValue::List(_) => "list",
            DataValue::Hash(_) => "hash",
            DataValue::Set(_) => "set",
            DataValue::SortedSet(_) => "zset",
        }
    }
}

/// A stored value together with its expiry and access metadata.
#[derive(Debug, Clone)]
pub struct ValueCell {
    pub data: DataValue,
    /// Absolute expiry in unix milliseconds.
    pub expire_at: Option<u64>,
    /// Unix milliseconds of the last read or write.
    pub last_accessed: u64,
    pub lfu: LfuInfo,
    /// Payload size in bytes, kept in step with `data` by the keyspace.
    pub size: usize,
}

impl ValueCell {
    pub fn new(data: DataValue) -> Self {
        let size = data.memory_usage();
        Self {
            data,
            expire_at: None,
            last_accessed: unix_millis(),
            lfu: LfuInfo::default(),
            size,
        }
    }

    pub fn with_expiry(mut self, expire_at: Option<u64>) -> Self {
        self.expire_at = expire_at;
        self
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expire_at.is_some_and(|at| at <= now_ms)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_millis())
    }

    /// Remaining time to live in milliseconds, if the key is volatile.
    pub fn remaining_ttl_ms(&self) -> Option<u64> {
        self.expire_at.map(|at| at.saturating_sub(unix_millis()))
    }

    /// Records an access for the LRU and LFU policies.
    pub fn touch(&mut self) {
        self.last_accessed = unix_millis();

        let now = lfu_time_now();
        let decay = now.wrapping_sub(self.lfu.last_decrement_time) / LFU_DECAY_TIME_MINUTES;
        let counter = self.lfu.counter.saturating_sub(decay.min(255) as u8);
        self.lfu.counter = lfu_log_incr(counter);
        self.lfu.last_decrement_time = now;
    }

    /// Current LFU counter with time decay applied, without recording an access.
    pub fn lfu_counter(&self) -> u8 {
        let decay = lfu_time_now().wrapping_sub(self.lfu.last_decrement_time) / LFU_DECAY_TIME_MINUTES;
        self.lfu.counter.saturating_sub(decay.min(255) as u8)
    }

    /// The command sequence that recreates this key when replayed.
    ///
    /// Strings carry their expiry inline; every other type is followed by a
    /// `PEXPIREAT` when volatile.
    pub fn to_rewrite_commands(&self, key: &Bytes) -> Vec<Vec<Bytes>> {
        let mut commands: Vec<Vec<Bytes>> = match &self.data {
            DataValue::String(value) => {
                let mut args = vec![
                    Bytes::from_static(b"SET"),
                    key.clone(),
                    value.clone(),
                ];
                if let Some(at) = self.expire_at {
                    args.push(Bytes::from_static(b"PXAT"));
                    args.push(Bytes::from(at.to_string()));
                }
                return vec![args];
            }
            DataValue::List(items) => chunked(b"RPUSH", key, items.iter().cloned()),
            DataValue::Set(members) => chunked(b"SADD", key, members.iter().cloned()),
            DataValue::Hash(fields) => chunked(
                b"HSET",
                key,
                fields.iter().flat_map(|(f, v)| [f.clone(), v.clone()]),
            ),
            DataValue::SortedSet(zset) => chunked(
                b"ZADD",
                key,
                zset.iter()
                    .flat_map(|e| [format_score(e.score), e.member.clone()]),
            ),
            DataValue::HyperLogLog(_) => vec![vec![
                Bytes::from_static(b"RESTORE"),
                key.clone(),
                Bytes::from_static(b"0"),
                value_codec::dump(&self.data),
                Bytes::from_static(b"REPLACE"),
            ]],
        };

        if !commands.is_empty()
            && let Some(at) = self.expire_at
        {
            commands.push(vec![
                Bytes::from_static(b"PEXPIREAT"),
                key.clone(),
                Bytes::from(at.to_string()),
            ]);
        }
        commands
    }
}

/// Splits `items` into `<cmd> key a b c ...` argument lists. Hash and sorted-set
/// callers pass pairs, so the chunk size is doubled for them to keep pairs whole.
fn chunked<I>(name: &'static [u8], key: &Bytes, items: I) -> Vec<Vec<Bytes>>
where
    I: Iterator<Item = Bytes>,
{
    let per_command = match name {
        b"HSET" | b"ZADD" => REWRITE_CHUNK_SIZE * 2,
        _ => REWRITE_CHUNK_SIZE,
    };
    let items: Vec<Bytes> = items.collect();
    items
        .chunks(per_command)
        .map(|chunk| {
            let mut args = Vec::with_capacity(chunk.len() + 2);
            args.push(Bytes::from_static(name));
            args.push(key.clone());
            args.extend_from_slice(chunk);
            args
        })
        .collect()
}

const LFU_INIT_VAL: u8 = 5;
const LFU_DECAY_TIME_MINUTES: u16 = 1;
const LFU_LOG_FACTOR: f64 = 10.0;

fn lfu_time_now() -> u16 {
    ((unix_millis() / 60_000) & 0xFFFF) as u16
}

fn lfu_log_incr(counter: u8) -> u8 {
    if counter == u8::MAX {
        return counter;
    }
    let r: f64 = rand::random();
    let baseval = counter.saturating_sub(LFU_INIT_VAL) as f64;
    let p = 1.0 / (baseval * LFU_LOG_FACTOR + 1.0);
    if r < p { counter + 1 } else { counter }
}
