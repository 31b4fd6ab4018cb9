// src/core/persistence/value_codec.rs

//! Serialized single-value payloads used by `DUMP`, `RESTORE` and the log
//! rewrite of HyperLogLog keys.
//!
//! Layout: `type (1) | body | version (u16 LE) | crc64 (u64 LE)`. The checksum
//! covers everything before it.

use crate::core::CaradeError;
use crate::core::storage::data_types::DataValue;
use crate::core::storage::hll::HyperLogLog;
use crate::core::storage::zset::SortedSet;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use crc::{CRC_64_REDIS, Crc};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

const PAYLOAD_VERSION: u16 = 1;
const FOOTER_LEN: usize = 2 + 8;
const CHECKSUM: Crc<u64> = Crc::<u64>::new(&CRC_64_REDIS);

const TYPE_STRING: u8 = 0;
const TYPE_LIST: u8 = 1;
const TYPE_SET: u8 = 2;
const TYPE_ZSET: u8 = 3;
const TYPE_HASH: u8 = 4;
const TYPE_HYPERLOGLOG: u8 = 8;

/// Serializes a value into a self-checking payload.
pub fn dump(data: &DataValue) -> Bytes {
    let mut buf = BytesMut::with_capacity(data.memory_usage() + 16);
    match data {
        DataValue::String(val) => {
            buf.put_u8(TYPE_STRING);
            write_string(&mut buf, val);
        }
        DataValue::List(list) => {
            buf.put_u8(TYPE_LIST);
            write_length(&mut buf, list.len() as u64);
            for item in list {
                write_string(&mut buf, item);
            }
        }
        DataValue::Set(set) => {
            buf.put_u8(TYPE_SET);
            write_length(&mut buf, set.len() as u64);
            for member in set {
                write_string(&mut buf, member);
            }
        }
        DataValue::SortedSet(zset) => {
            buf.put_u8(TYPE_ZSET);
            write_length(&mut buf, zset.len() as u64);
            for entry in zset.iter() {
                write_string(&mut buf, &entry.member);
                buf.put_f64_le(entry.score);
            }
        }
        DataValue::Hash(hash) => {
            buf.put_u8(TYPE_HASH);
            write_length(&mut buf, hash.len() as u64);
            for (field, val) in hash {
                write_string(&mut buf, field);
                write_string(&mut buf, val);
            }
        }
        DataValue::HyperLogLog(hll) => {
            buf.put_u8(TYPE_HYPERLOGLOG);
            write_string(&mut buf, hll.registers());
        }
    }
    buf.put_u16_le(PAYLOAD_VERSION);
    let crc = CHECKSUM.checksum(&buf);
    buf.put_u64_le(crc);
    buf.freeze()
}

/// Verifies and decodes a payload produced by [`dump`].
pub fn restore(payload: &Bytes) -> Result<DataValue, CaradeError> {
    if payload.len() < 1 + FOOTER_LEN {
        return Err(CaradeError::BadDumpPayload);
    }
    let (body, footer) = payload.split_at(payload.len() - 8);
    let mut crc_bytes = footer;
    if CHECKSUM.checksum(body) != crc_bytes.get_u64_le() {
        return Err(CaradeError::BadDumpPayload);
    }
    let mut version_bytes = &body[body.len() - 2..];
    if version_bytes.get_u16_le() > PAYLOAD_VERSION {
        return Err(CaradeError::BadDumpPayload);
    }

    let mut cursor = payload.slice(..payload.len() - FOOTER_LEN);
    let value_type = cursor.get_u8();
    let value = match value_type {
        TYPE_STRING => DataValue::String(read_string(&mut cursor)?),
        TYPE_LIST => {
            let len = read_length(&mut cursor)?;
            let mut list = VecDeque::with_capacity(len.min(cursor.remaining()));
            for _ in 0..len {
                list.push_back(read_string(&mut cursor)?);
            }
            DataValue::List(list)
        }
        TYPE_SET => {
            let len = read_length(&mut cursor)?;
            let mut set = HashSet::with_capacity(len.min(cursor.remaining()));
            for _ in 0..len {
                set.insert(read_string(&mut cursor)?);
            }
            DataValue::Set(set)
        }
        TYPE_ZSET => {
            let len = read_length(&mut cursor)?;
            let mut zset = SortedSet::new();
            for _ in 0..len {
                let member = read_string(&mut cursor)?;
                if cursor.remaining() < 8 {
                    return Err(CaradeError::BadDumpPayload);
                }
                let score = cursor.get_f64_le();
                if score.is_nan() {
                    return Err(CaradeError::BadDumpPayload);
                }
                zset.add(score, member);
            }
            DataValue::SortedSet(zset)
        }
        TYPE_HASH => {
            let len = read_length(&mut cursor)?;
            let mut hash = IndexMap::with_capacity(len.min(cursor.remaining()));
            for _ in 0..len {
                let field = read_string(&mut cursor)?;
                let val = read_string(&mut cursor)?;
                hash.insert(field, val);
            }
            DataValue::Hash(hash)
        }
        TYPE_HYPERLOGLOG => {
            let registers = read_string(&mut cursor)?;
            let hll = HyperLogLog::from_registers(&registers).ok_or(CaradeError::BadDumpPayload)?;
            DataValue::HyperLogLog(Box::new(hll))
        }
        _ => return Err(CaradeError::BadDumpPayload),
    };
    if cursor.has_remaining() {
        return Err(CaradeError::BadDumpPayload);
    }
    Ok(value)
}

fn write_string(buf: &mut BytesMut, s: &[u8]) {
    write_length(buf, s.len() as u64);
    buf.put_slice(s);
}

fn read_string(cursor: &mut Bytes) -> Result<Bytes, CaradeError> {
    let len = read_length(cursor)?;
    if cursor.remaining() < len {
        return Err(CaradeError::BadDumpPayload);
    }
    Ok(cursor.split_to(len))
}

/// 6-bit, 14-bit, 32-bit or 64-bit length prefix, selected by the top two bits.
fn write_length(buf: &mut BytesMut, len: u64) {
    if len < (1 << 6) {
        buf.put_u8(len as u8);
    } else if len < (1 << 14) {
        buf.put_u16((len | (1 << 14)) as u16);
    } else if len < (1 << 32) {
        buf.put_u8(0x80);
        buf.put_u32(len as u32);
    } else {
        buf.put_u8(0x81);
        buf.put_u64(len);
    }
}

fn read_length(cursor: &mut Bytes) -> Result<usize, CaradeError> {
    if !cursor.has_remaining() {
        return Err(CaradeError::BadDumpPayload);
    }
    let first = cursor.get_u8();
    let len = match first >> 6 {
        0b00 => u64::from(first & 0x3F),
        0b01 => {
            if !cursor.has_remaining() {
                return Err(CaradeError::BadDumpPayload);
            }
            (u64::from(first & 0x3F) << 8) | u64::from(cursor.get_u8())
        }
        _ => match first {
            0x80 if cursor.remaining() >= 4 => u64::from(cursor.get_u32()),
            0x81 if cursor.remaining() >= 8 => cursor.get_u64(),
            _ => return Err(CaradeError::BadDumpPayload),
        },
    };
    usize::try_from(len).map_err(|_| CaradeError::BadDumpPayload)
}
