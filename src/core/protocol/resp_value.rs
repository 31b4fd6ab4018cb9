// src/core/protocol/resp_value.rs

//! The reply type produced by command execution.

use super::RespFrame;
use bytes::Bytes;

/// A command's reply before it is turned into a wire frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    BulkString(Bytes),
    Integer(i64),
    Array(Vec<RespValue>),
    Null,
    NullArray,
    Error(String),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".into())
    }

    /// Formats a score the way replies and log entries carry it.
    pub fn from_score(score: f64) -> Self {
        RespValue::BulkString(format_score(score))
    }
}

/// Canonical text form of a sorted-set score.
pub fn format_score(score: f64) -> Bytes {
    if score == f64::INFINITY {
        Bytes::from_static(b"inf")
    } else if score == f64::NEG_INFINITY {
        Bytes::from_static(b"-inf")
    } else if score.fract() == 0.0 && score.abs() < 1e17 {
        Bytes::from(itoa::Buffer::new().format(score as i64).to_owned())
    } else {
        Bytes::from(ryu::Buffer::new().format(score).to_owned())
    }
}

impl From<RespValue> for RespFrame {
    fn from(val: RespValue) -> Self {
        match val {
            RespValue::SimpleString(s) => RespFrame::SimpleString(s),
            RespValue::BulkString(b) => RespFrame::BulkString(b),
            RespValue::Integer(i) => RespFrame::Integer(i),
            RespValue::Array(arr) => RespFrame::Array(arr.into_iter().map(Into::into).collect()),
            RespValue::Null => RespFrame::Null,
            RespValue::NullArray => RespFrame::NullArray,
            RespValue::Error(s) => RespFrame::Error(s),
        }
    }
}
