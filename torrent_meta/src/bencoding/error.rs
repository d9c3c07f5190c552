use thiserror::Error;

/// Errors raised while decoding or encoding bencode.
#[derive(Debug, Error)]
pub enum BencodeError {
    #[error("unexpected end of input at pos {0}")]
    UnexpectedEof(usize),

    #[error("invalid integer at pos {pos}: {reason}")]
    InvalidInteger { pos: usize, reason: String },

    #[error("invalid string length at pos {0}")]
    InvalidStringLength(usize),

    #[error("invalid bencode char '{ch}' at pos {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("dict key must be a string (pos {0})")]
    NonStringKey(usize),

    #[error("duplicate dict key {key:?} at pos {pos}")]
    DuplicateKey { key: String, pos: usize },

    #[error("trailing data after value at pos {0}")]
    TrailingData(usize),

    #[error("nesting too deep at pos {0}")]
    NestingTooDeep(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
