// src/core/commands/helpers.rs

//! Provides helper functions for parsing command arguments from `RespFrame`s.
//! These helpers reduce boilerplate and ensure consistent error handling across commands.

use crate::core::CaradeError;
use crate::core::protocol::RespFrame;
use crate::core::storage::zset::ScoreBoundary;
use bytes::Bytes;
use std::str::FromStr;
use std::time::Duration;

/// A helper struct to parse command arguments sequentially.
/// This simplifies parsing optional flags and value pairs.
pub struct ArgParser<'a> {
    args: &'a [RespFrame],
    cursor: usize,
}

impl<'a> ArgParser<'a> {
    /// Creates a new parser over a slice of arguments.
    pub fn new(args: &'a [RespFrame]) -> Self {
        Self { args, cursor: 0 }
    }

    /// Checks if the next argument matches a specific flag (case-insensitively).
    /// If it matches, consumes the argument and returns true.
    pub fn match_flag(&mut self, flag_name: &str) -> bool {
        if let Some(arg_str) = self.peek_str()
            && arg_str.eq_ignore_ascii_case(flag_name)
        {
            self.cursor += 1;
            return true;
        }
        false
    }

    /// Checks if the next argument matches an option name.
    /// If it matches, consumes both the option name and its value,
    /// then parses the value into the specified type `T`.
    pub fn match_option<T>(&mut self, opt_name: &str) -> Result<Option<T>, CaradeError>
    where
        T: FromStr,
    {
        if let Some(arg_str) = self.peek_str()
            && arg_str.eq_ignore_ascii_case(opt_name)
        {
            let value_frame = self
                .args
                .get(self.cursor + 1)
                .ok_or(CaradeError::SyntaxError)?;
            let parsed_value = extract_string(value_frame)?
                .parse::<T>()
                .map_err(|_| CaradeError::NotAnInteger)?;
            self.cursor += 2;
            return Ok(Some(parsed_value));
        }
        Ok(None)
    }

    /// Returns the remaining arguments that have not been consumed.
    pub fn remaining_args(&self) -> &'a [RespFrame] {
        &self.args[self.cursor..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.args.len()
    }

    /// Peeks at the next argument as a string without consuming it.
    fn peek_str(&self) -> Option<String> {
        self.args
            .get(self.cursor)
            .and_then(|frame| extract_string(frame).ok())
    }
}

/// Extracts a `String` from a `RespFrame::BulkString`.
/// Returns a `WrongType` error if the frame is not a BulkString or not valid UTF-8.
pub fn extract_string(frame: &RespFrame) -> Result<String, CaradeError> {
    if let RespFrame::BulkString(bs) = frame {
        String::from_utf8(bs.to_vec()).map_err(|_| CaradeError::WrongType)
    } else {
        Err(CaradeError::WrongType)
    }
}

/// Extracts `Bytes` from a `RespFrame::BulkString`.
/// Returns a `WrongType` error if the frame is not a BulkString.
pub fn extract_bytes(frame: &RespFrame) -> Result<Bytes, CaradeError> {
    match frame {
        RespFrame::BulkString(bs) => Ok(bs.clone()),
        _ => Err(CaradeError::WrongType),
    }
}

/// Validates that the number of arguments matches an exact expected count.
pub fn validate_arg_count(args: &[RespFrame], expected: usize, cmd: &str) -> Result<(), CaradeError> {
    if args.len() != expected {
        Err(CaradeError::WrongArgumentCount(cmd.to_string()))
    } else {
        Ok(())
    }
}

/// Validates that there are at least `min` arguments.
pub fn validate_min_args(args: &[RespFrame], min: usize, cmd: &str) -> Result<(), CaradeError> {
    if args.len() < min {
        Err(CaradeError::WrongArgumentCount(cmd.to_string()))
    } else {
        Ok(())
    }
}

/// Parses arguments for commands that follow the pattern `COMMAND key value1 [value2 ...]`.
pub fn parse_key_and_values(
    args: &[RespFrame],
    min_args: usize,
    cmd: &str,
) -> Result<(Bytes, Vec<Bytes>), CaradeError> {
    validate_min_args(args, min_args, cmd)?;
    let key = extract_bytes(&args[0])?;
    let values = args[1..]
        .iter()
        .map(extract_bytes)
        .collect::<Result<_, _>>()?;
    Ok((key, values))
}

/// Parses arguments for commands that follow the pattern `COMMAND key field1 value1 [field2 value2 ...]`.
pub fn parse_key_and_field_value_pairs(
    args: &[RespFrame],
    cmd: &str,
) -> Result<(Bytes, Vec<(Bytes, Bytes)>), CaradeError> {
    if args.len() < 3 || args.len() % 2 != 1 {
        return Err(CaradeError::WrongArgumentCount(cmd.to_string()));
    }
    let key = extract_bytes(&args[0])?;
    let fields = args[1..]
        .chunks_exact(2)
        .map(|chunk| -> Result<(Bytes, Bytes), CaradeError> {
            Ok((extract_bytes(&chunk[0])?, extract_bytes(&chunk[1])?))
        })
        .collect::<Result<_, _>>()?;
    Ok((key, fields))
}

/// Collects every argument as a key.
pub fn parse_keys(args: &[RespFrame], cmd: &str) -> Result<Vec<Bytes>, CaradeError> {
    validate_min_args(args, 1, cmd)?;
    args.iter().map(extract_bytes).collect()
}

pub fn parse_i64(frame: &RespFrame) -> Result<i64, CaradeError> {
    extract_string(frame)?
        .parse::<i64>()
        .map_err(|_| CaradeError::NotAnInteger)
}

/// Parses a float argument. `inf` and `-inf` are accepted, NaN is not.
pub fn parse_f64(frame: &RespFrame) -> Result<f64, CaradeError> {
    let value = extract_string(frame)?
        .parse::<f64>()
        .map_err(|_| CaradeError::NotAFloat)?;
    if value.is_nan() {
        return Err(CaradeError::NotAFloat);
    }
    Ok(value)
}

/// Parses a score range bound: `1.5`, `(1.5`, `-inf` or `+inf`.
pub fn parse_score_boundary(frame: &RespFrame) -> Result<ScoreBoundary, CaradeError> {
    let s = extract_string(frame)?;
    let (exclusive, number) = match s.strip_prefix('(') {
        Some(rest) => (true, rest),
        None => (false, s.as_str()),
    };
    let value = match number.to_ascii_lowercase().as_str() {
        "+inf" | "inf" => f64::INFINITY,
        "-inf" => f64::NEG_INFINITY,
        other => other
            .parse::<f64>()
            .map_err(|_| CaradeError::InvalidRequest("min or max is not a float".into()))?,
    };
    if value.is_nan() {
        return Err(CaradeError::InvalidRequest("min or max is not a float".into()));
    }
    Ok(if exclusive {
        ScoreBoundary::Exclusive(value)
    } else {
        ScoreBoundary::Inclusive(value)
    })
}

/// Parses a blocking timeout in seconds. `0` means wait forever and yields `None`.
pub fn parse_timeout(frame: &RespFrame) -> Result<Option<Duration>, CaradeError> {
    let secs = extract_string(frame)?
        .parse::<f64>()
        .map_err(|_| CaradeError::InvalidTimeout)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(CaradeError::InvalidTimeout);
    }
    if secs == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|_| CaradeError::InvalidTimeout)
}

/// Renders a timeout back into its argument form.
pub fn format_timeout(timeout: Option<Duration>) -> Bytes {
    match timeout {
        Some(d) => Bytes::from(d.as_secs_f64().to_string()),
        None => Bytes::from_static(b"0"),
    }
}
