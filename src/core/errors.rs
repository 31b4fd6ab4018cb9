// src/core/errors.rs

//! The error type shared by the storage engine, the command layer and persistence.

use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use thiserror::Error;

/// Every failure a command or background task can report.
///
/// The `Display` text of a variant is exactly what a client receives in a RESP
/// error reply, so the Redis-compatible prefixes (`WRONGTYPE`, `BUSYKEY`, ...) live here.
#[derive(Error, Debug)]
pub enum CaradeError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR syntax error")]
    SyntaxError,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR value is not a valid float")]
    NotAFloat,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR no such key")]
    KeyNotFound,

    #[error("BUSYKEY Target key name already exists.")]
    BusyKey,

    #[error("ERR {0}")]
    InvalidRequest(String),

    #[error("ERR {0}")]
    InvalidState(String),

    #[error("ERR DB index is out of range")]
    DbIndexOutOfRange,

    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,

    #[error("ERR DUMP payload version or checksum are wrong")]
    BadDumpPayload,

    #[error("EXECABORT Transaction discarded because of previous errors.")]
    ExecAborted,

    #[error("OOM command not allowed when used memory > 'maxmemory'.")]
    MaxMemoryReached,

    #[error("ERR Background append only file rewriting already in progress")]
    RewriteInProgress,

    #[error("ERR Persistence Error: {0}")]
    AofError(String),

    #[error("ERR Internal Server Error: {0}")]
    Internal(String),
}

// `std::io::Error` is not `Clone`, so the `Io` variant shares it through an `Arc`.
impl Clone for CaradeError {
    fn clone(&self) -> Self {
        match self {
            CaradeError::Io(e) => CaradeError::Io(Arc::clone(e)),
            CaradeError::IncompleteData => CaradeError::IncompleteData,
            CaradeError::UnknownCommand(s) => CaradeError::UnknownCommand(s.clone()),
            CaradeError::SyntaxError => CaradeError::SyntaxError,
            CaradeError::WrongArgumentCount(s) => CaradeError::WrongArgumentCount(s.clone()),
            CaradeError::WrongType => CaradeError::WrongType,
            CaradeError::NotAnInteger => CaradeError::NotAnInteger,
            CaradeError::NotAFloat => CaradeError::NotAFloat,
            CaradeError::Overflow => CaradeError::Overflow,
            CaradeError::KeyNotFound => CaradeError::KeyNotFound,
            CaradeError::BusyKey => CaradeError::BusyKey,
            CaradeError::InvalidRequest(s) => CaradeError::InvalidRequest(s.clone()),
            CaradeError::InvalidState(s) => CaradeError::InvalidState(s.clone()),
            CaradeError::DbIndexOutOfRange => CaradeError::DbIndexOutOfRange,
            CaradeError::InvalidTimeout => CaradeError::InvalidTimeout,
            CaradeError::BadDumpPayload => CaradeError::BadDumpPayload,
            CaradeError::ExecAborted => CaradeError::ExecAborted,
            CaradeError::MaxMemoryReached => CaradeError::MaxMemoryReached,
            CaradeError::RewriteInProgress => CaradeError::RewriteInProgress,
            CaradeError::AofError(s) => CaradeError::AofError(s.clone()),
            CaradeError::Internal(s) => CaradeError::Internal(s.clone()),
        }
    }
}

impl PartialEq for CaradeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CaradeError::Io(e1), CaradeError::Io(e2)) => e1.to_string() == e2.to_string(),
            (CaradeError::UnknownCommand(s1), CaradeError::UnknownCommand(s2)) => s1 == s2,
            (CaradeError::WrongArgumentCount(s1), CaradeError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (CaradeError::InvalidRequest(s1), CaradeError::InvalidRequest(s2)) => s1 == s2,
            (CaradeError::InvalidState(s1), CaradeError::InvalidState(s2)) => s1 == s2,
            (CaradeError::AofError(s1), CaradeError::AofError(s2)) => s1 == s2,
            (CaradeError::Internal(s1), CaradeError::Internal(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl From<std::io::Error> for CaradeError {
    fn from(e: std::io::Error) -> Self {
        CaradeError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for CaradeError {
    fn from(_: std::str::Utf8Error) -> Self {
        CaradeError::WrongType
    }
}

impl From<std::string::FromUtf8Error> for CaradeError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        CaradeError::WrongType
    }
}

impl From<ParseIntError> for CaradeError {
    fn from(_: ParseIntError) -> Self {
        CaradeError::NotAnInteger
    }
}

impl From<ParseFloatError> for CaradeError {
    fn from(_: ParseFloatError) -> Self {
        CaradeError::NotAFloat
    }
}
