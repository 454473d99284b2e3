use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("payload truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("unknown field tag {0}")]
    UnknownTag(u8),

    #[error("field count {0} exceeds limit")]
    TooManyFields(usize),

    #[error("unsupported compact length encoding")]
    UnsupportedCompact,

    #[error("{0} trailing bytes after last field")]
    TrailingBytes(usize),

    #[error("commitment has no fields")]
    Empty,

    #[error("first field is not raw data")]
    NotRaw,

    #[error("raw field is {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("raw field of {0} bytes exceeds the 128-byte variant limit")]
    RawTooLong(usize),
}
