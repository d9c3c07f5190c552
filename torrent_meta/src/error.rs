use thiserror::Error;

use crate::bencoding::BencodeError;

/// Errors surfaced by descriptor construction, piece reads and merges.
///
/// Each condition stays distinct so callers can tell bad arguments, bad
/// metadata, storage trouble and corrupted data apart.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// The caller passed an unusable argument (piece index out of range,
    /// zero piece length).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Encoded bytes violate the descriptor schema or are internally
    /// inconsistent.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Reading, writing or seeking the underlying storage failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes read for a piece do not hash to the recorded digest.
    #[error("piece {index} failed hash verification")]
    IntegrityFailure { index: usize },

    /// A merge was attempted without every piece present.
    #[error("missing piece {0}")]
    MissingPiece(usize),
}

impl From<BencodeError> for TorrentError {
    fn from(err: BencodeError) -> Self {
        match err {
            BencodeError::Io(e) => TorrentError::Io(e),
            other => TorrentError::MalformedInput(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TorrentError>;
