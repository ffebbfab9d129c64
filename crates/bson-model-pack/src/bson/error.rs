//! BSON codec error type.

use thiserror::Error;

/// Error type for BSON encoding and decoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BsonError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unsupported BSON element type: 0x{0:02x}")]
    UnsupportedType(u8),
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("invalid length {0}")]
    InvalidLength(i64),
    #[error("invalid boolean byte: 0x{0:02x}")]
    InvalidBoolean(u8),
    #[error("invalid array key {found:?}, expected {expected:?}")]
    InvalidArrayKey { expected: String, found: String },
    #[error("{0} trailing bytes after document")]
    TrailingBytes(usize),
    #[error("C string contains a NUL byte: {0:?}")]
    KeyContainsNul(String),
    #[error("invalid ObjectId hex: {0:?}")]
    InvalidObjectId(String),
    #[error("invalid Decimal128 literal: {0:?}")]
    InvalidDecimal128(String),
}
