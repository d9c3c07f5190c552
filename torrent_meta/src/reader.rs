//! Reading pieces back out of a source file and checking them against the
//! descriptor's digests.
//!
//! Every read opens its own handle, so reads of different pieces can run on
//! different threads against the same descriptor without coordination.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::bencoding::sha1_digest;
use crate::error::{Result, TorrentError};
use crate::torrent::TorrentDescriptor;

/// Outcome of checking one piece of a source file.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PieceStatus {
    /// The source is too short to contain the piece.
    Missing,
    /// The piece is present but its digest does not match.
    Corrupt,
    /// The piece is present and verified.
    Have,
}

/// Checks `data` against the recorded digest of piece `index`.
///
/// Only the digest is compared; callers holding bytes from elsewhere use this
/// before handing them to [`crate::merger::merge`].
pub fn verify_piece(descriptor: &TorrentDescriptor, index: usize, data: &[u8]) -> Result<()> {
    let expected = descriptor.piece_hashes().get(index).ok_or_else(|| {
        TorrentError::InvalidArgument(format!(
            "invalid piece index {} (descriptor has {} pieces)",
            index,
            descriptor.num_pieces()
        ))
    })?;
    if &sha1_digest(data) != expected {
        warn!(index, "piece failed hash verification");
        return Err(TorrentError::IntegrityFailure { index });
    }
    Ok(())
}

/// Reads piece `index` from `source` and verifies it.
///
/// # Errors
///
/// * `InvalidArgument` if `index` is out of range.
/// * `MalformedInput` if the descriptor's sizes are inconsistent.
/// * `Io` if the source cannot be opened or holds fewer bytes than the piece
///   needs.
/// * `IntegrityFailure` if the bytes do not match the recorded digest.
pub fn read_piece<P: AsRef<Path>>(
    descriptor: &TorrentDescriptor,
    source: P,
    index: usize,
) -> Result<Vec<u8>> {
    let size = descriptor.piece_size(index)?;
    let offset = descriptor.piece_offset(index)?;

    // The sizes come from the descriptor, so the buffer only grows with the
    // bytes the source actually holds.
    let mut file = File::open(source)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut piece = Vec::new();
    let read = (&mut file).take(size).read_to_end(&mut piece)?;
    if (read as u64) < size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("piece {} needs {} bytes, source holds {}", index, size, read),
        )
        .into());
    }
    debug!(index, offset, size, "read piece");

    verify_piece(descriptor, index, &piece)?;
    Ok(piece)
}

/// Reads piece `index` and classifies the outcome.
///
/// A short read is [`PieceStatus::Missing`] and a digest mismatch is
/// [`PieceStatus::Corrupt`]; any other error is returned.
pub fn check_piece<P: AsRef<Path>>(
    descriptor: &TorrentDescriptor,
    source: P,
    index: usize,
) -> Result<PieceStatus> {
    match read_piece(descriptor, source, index) {
        Ok(_) => Ok(PieceStatus::Have),
        Err(TorrentError::IntegrityFailure { .. }) => Ok(PieceStatus::Corrupt),
        Err(TorrentError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Ok(PieceStatus::Missing)
        }
        Err(e) => Err(e),
    }
}

/// Runs [`check_piece`] over every piece of `source`, in order.
pub fn check_pieces<P: AsRef<Path>>(
    descriptor: &TorrentDescriptor,
    source: P,
) -> Result<Vec<PieceStatus>> {
    let source = source.as_ref();
    let statuses = (0..descriptor.num_pieces())
        .map(|index| check_piece(descriptor, source, index))
        .collect::<Result<Vec<_>>>()?;
    info!(
        have = statuses.iter().filter(|&&s| s == PieceStatus::Have).count(),
        total = statuses.len(),
        "checked existing data"
    );
    Ok(statuses)
}
