// src/core/protocol/resp_frame.rs

//! RESP2 frames and the `tokio_util` codec used on client sockets and when
//! reading or writing the append log.

use crate::core::CaradeError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

const MAX_FRAME_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024;
const MAX_RECURSION_DEPTH: usize = 256;
const MAX_INLINE_LENGTH: usize = 64 * 1024;

/// A single frame of the RESP protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
}

impl RespFrame {
    /// Builds the array-of-bulk-strings form used for commands and log entries.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        RespFrame::Array(args.into_iter().map(RespFrame::BulkString).collect())
    }

    /// Encodes this frame into a fresh buffer.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, CaradeError> {
        let mut buf = BytesMut::new();
        RespFrameCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }
}

/// Encodes and decodes `RespFrame`s.
///
/// Besides the multibulk form, the decoder accepts inline commands
/// (`PING\r\n`), which are turned into an array of bulk strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct RespFrameCodec;

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = CaradeError;

    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut num = itoa::Buffer::new();
        match item {
            RespFrame::SimpleString(s) => {
                dst.extend_from_slice(b"+");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Error(s) => {
                dst.extend_from_slice(b"-");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Integer(i) => {
                dst.extend_from_slice(b":");
                dst.extend_from_slice(num.format(i).as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::BulkString(b) => {
                dst.reserve(b.len() + 16);
                dst.extend_from_slice(b"$");
                dst.extend_from_slice(num.format(b.len()).as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Null => dst.extend_from_slice(b"$-1\r\n"),
            RespFrame::NullArray => dst.extend_from_slice(b"*-1\r\n"),
            RespFrame::Array(arr) => {
                dst.extend_from_slice(b"*");
                dst.extend_from_slice(num.format(arr.len()).as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in arr {
                    self.encode(frame, dst)?;
                }
            }
        }
        Ok(())
    }
}

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = CaradeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut bytes = &src[..];
        match decode_recursive(&mut bytes, 0) {
            Ok(frame) => {
                let consumed = src.len() - bytes.len();
                src.advance(consumed);
                Ok(Some(frame))
            }
            Err(CaradeError::IncompleteData) => {
                if src.len() > MAX_INLINE_LENGTH && !matches!(src[0], b'*' | b'$') {
                    return Err(CaradeError::InvalidRequest(
                        "Protocol error: too big inline request".into(),
                    ));
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn decode_recursive(bytes: &mut &[u8], depth: usize) -> Result<RespFrame, CaradeError> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(CaradeError::InvalidRequest(
            "Protocol error: nesting too deep".into(),
        ));
    }
    let Some(&prefix) = bytes.first() else {
        return Err(CaradeError::IncompleteData);
    };

    match prefix {
        b'+' => {
            *bytes = &bytes[1..];
            let line = take_line(bytes)?;
            Ok(RespFrame::SimpleString(
                String::from_utf8_lossy(line).into_owned(),
            ))
        }
        b'-' => {
            *bytes = &bytes[1..];
            let line = take_line(bytes)?;
            Ok(RespFrame::Error(String::from_utf8_lossy(line).into_owned()))
        }
        b':' => {
            *bytes = &bytes[1..];
            let line = take_line(bytes)?;
            Ok(RespFrame::Integer(parse_decimal(line)?))
        }
        b'$' => {
            *bytes = &bytes[1..];
            let line = take_line(bytes)?;
            let len = parse_decimal(line)?;
            if len == -1 {
                return Ok(RespFrame::Null);
            }
            if len < 0 || len as usize > MAX_BULK_STRING_SIZE {
                return Err(CaradeError::InvalidRequest(
                    "Protocol error: invalid bulk length".into(),
                ));
            }
            let len = len as usize;
            if bytes.len() < len + CRLF_LEN {
                return Err(CaradeError::IncompleteData);
            }
            if &bytes[len..len + CRLF_LEN] != CRLF {
                return Err(CaradeError::SyntaxError);
            }
            let data = Bytes::copy_from_slice(&bytes[..len]);
            *bytes = &bytes[len + CRLF_LEN..];
            Ok(RespFrame::BulkString(data))
        }
        b'*' => {
            *bytes = &bytes[1..];
            let line = take_line(bytes)?;
            let len = parse_decimal(line)?;
            if len == -1 {
                return Ok(RespFrame::NullArray);
            }
            if len < 0 || len as usize > MAX_FRAME_ELEMENTS {
                return Err(CaradeError::InvalidRequest(
                    "Protocol error: invalid multibulk length".into(),
                ));
            }
            let mut frames = Vec::with_capacity(len as usize);
            for _ in 0..len {
                frames.push(decode_recursive(bytes, depth + 1)?);
            }
            Ok(RespFrame::Array(frames))
        }
        _ if depth == 0 => decode_inline(bytes),
        _ => Err(CaradeError::SyntaxError),
    }
}

/// Splits an inline command line on whitespace.
fn decode_inline(bytes: &mut &[u8]) -> Result<RespFrame, CaradeError> {
    let line = take_line(bytes)?;
    let parts = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| RespFrame::BulkString(Bytes::copy_from_slice(part)))
        .collect();
    Ok(RespFrame::Array(parts))
}

fn take_line<'a>(bytes: &mut &'a [u8]) -> Result<&'a [u8], CaradeError> {
    let pos = bytes
        .windows(CRLF_LEN)
        .position(|w| w == CRLF)
        .ok_or(CaradeError::IncompleteData)?;
    let line = &bytes[..pos];
    *bytes = &bytes[pos + CRLF_LEN..];
    Ok(line)
}

fn parse_decimal(line: &[u8]) -> Result<i64, CaradeError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(CaradeError::SyntaxError)
}
