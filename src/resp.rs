//! Redis Serialization Protocol (RESP) values and their wire encoding.
//!
//! Requests and replies share one self-describing format: the first byte of a
//! frame selects the variant and every line ends in `\r\n`. Bulk strings are
//! length-prefixed, so their payload may contain any byte, `\r` and `\n`
//! included.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

const SIMPLE_STRING: u8 = b'+';
const ERROR: u8 = b'-';
const INTEGER: u8 = b':';
const BULK_STRING: u8 = b'$';
const ARRAY: u8 = b'*';

const CRLF: &[u8] = b"\r\n";

/// Deepest array nesting accepted by the decoder.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum RespError {
    #[error("truncated input")]
    TruncatedInput,
    #[error("unknown RESP type byte {0:#04x}")]
    UnknownType(u8),
    #[error("malformed integer")]
    MalformedInteger,
    #[error("malformed length")]
    MalformedLength,
    #[error("bulk string payload is not terminated by CRLF")]
    MissingTerminator,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("array nesting exceeds the maximum depth")]
    NestingTooDeep,
}

impl RespError {
    /// True when more bytes could still complete the frame.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, RespError::TruncatedInput)
    }

    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    /// The null bulk string, `$-1\r\n`.
    Null,
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Decodes one frame from the start of `input`.
    ///
    /// Returns the value together with the number of bytes it occupied, so the
    /// caller can advance past it and decode the next frame.
    pub fn decode(input: &[u8]) -> Result<(RespValue, usize), RespError> {
        let mut cursor = Cursor::new(input);
        let value = cursor.read_value(0)?;

        Ok((value, cursor.position))
    }

    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::new();
        self.encode_into(&mut buffer);
        buffer.freeze()
    }

    pub fn encode_into(&self, buffer: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buffer.put_u8(SIMPLE_STRING);
                buffer.put_slice(s.as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::Error(message) => {
                buffer.put_u8(ERROR);
                buffer.put_slice(message.as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buffer.put_u8(INTEGER);
                buffer.put_slice(n.to_string().as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buffer.put_u8(BULK_STRING);
                buffer.put_slice(data.len().to_string().as_bytes());
                buffer.put_slice(CRLF);
                buffer.put_slice(data);
                buffer.put_slice(CRLF);
            }
            RespValue::Null => buffer.put_slice(b"$-1\r\n"),
            RespValue::Array(elements) => {
                buffer.put_u8(ARRAY);
                buffer.put_slice(elements.len().to_string().as_bytes());
                buffer.put_slice(CRLF);

                for element in elements {
                    element.encode_into(buffer);
                }
            }
        }
    }
}

struct Cursor<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    fn read_value(&mut self, depth: usize) -> Result<RespValue, RespError> {
        let Some(&type_byte) = self.input.get(self.position) else {
            return Err(RespError::TruncatedInput);
        };
        self.position += 1;

        match type_byte {
            SIMPLE_STRING => Ok(RespValue::SimpleString(self.read_text_line()?)),
            ERROR => Ok(RespValue::Error(self.read_text_line()?)),
            INTEGER => Ok(RespValue::Integer(self.read_integer()?)),
            BULK_STRING => self.read_bulk_string(),
            ARRAY => self.read_array(depth),
            other => Err(RespError::UnknownType(other)),
        }
    }

    /// Returns the bytes up to the next CRLF and moves past the terminator.
    fn read_line(&mut self) -> Result<&'a [u8], RespError> {
        let input = self.input;
        let rest = &input[self.position..];
        let Some(end) = rest.windows(2).position(|window| window == CRLF) else {
            return Err(RespError::TruncatedInput);
        };

        self.position += end + 2;
        Ok(&rest[..end])
    }

    fn read_text_line(&mut self) -> Result<String, RespError> {
        let line = self.read_line()?;

        std::str::from_utf8(line)
            .map(str::to_string)
            .map_err(|_| RespError::InvalidUtf8)
    }

    fn read_integer(&mut self) -> Result<i64, RespError> {
        let line = self.read_line()?;

        std::str::from_utf8(line)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(RespError::MalformedInteger)
    }

    fn read_length(&mut self) -> Result<i64, RespError> {
        self.read_integer().map_err(|err| match err {
            RespError::MalformedInteger => RespError::MalformedLength,
            other => other,
        })
    }

    fn read_bulk_string(&mut self) -> Result<RespValue, RespError> {
        let length = self.read_length()?;

        if length < 0 {
            return Ok(RespValue::Null);
        }

        let length = usize::try_from(length).map_err(|_| RespError::MalformedLength)?;
        if self.input.len() - self.position < length.saturating_add(2) {
            return Err(RespError::TruncatedInput);
        }

        let end = self.position + length;

        let payload = Bytes::copy_from_slice(&self.input[self.position..end]);

        if &self.input[end..end + 2] != CRLF {
            return Err(RespError::MissingTerminator);
        }

        self.position = end + 2;
        Ok(RespValue::BulkString(payload))
    }

    fn read_array(&mut self, depth: usize) -> Result<RespValue, RespError> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(RespError::NestingTooDeep);
        }

        let length = self.read_length()?;

        // Only bulk strings have a null form; `Null` encodes as `$-1`.
        if length < 0 {
            return Err(RespError::MalformedLength);
        }

        // Every element takes at least three bytes, which bounds the
        // preallocation for hostile element counts.
        let remaining = self.input.len() - self.position;
        let capacity = usize::try_from(length)
            .map_err(|_| RespError::MalformedLength)?
            .min(remaining / 3);
        let mut elements = Vec::with_capacity(capacity);

        for _ in 0..length {
            elements.push(self.read_value(depth + 1)?);
        }

        Ok(RespValue::Array(elements))
    }
}
