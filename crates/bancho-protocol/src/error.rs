use std::io;

use thiserror::Error;

/// Everything that can go wrong while decoding or encoding a frame.
///
/// A `MalformedFrame` in the sense of the session runtime's error policy is
/// any variant here: short read, a reserved-byte mismatch, a negative
/// length, or an out-of-range tagged enum value.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unexpected end of stream: needed {needed} bytes, {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    #[error("invalid string lead byte: {0:#04x}")]
    InvalidStringLeadByte(u8),

    #[error("negative length where none was expected: {0}")]
    NegativeLength(i64),

    #[error("invalid enum value for {type_name}: {value}")]
    InvalidEnumValue { type_name: &'static str, value: i64 },

    #[error("invalid utf-8 in string payload")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
