//! Reassembly of a file from its pieces.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::atomic::write_atomic;
use crate::error::{Result, TorrentError};
use crate::torrent::TorrentDescriptor;

/// Writes `pieces` to `output` in index order.
///
/// Every index `0..num_pieces` must be present, otherwise the merge fails with
/// `MissingPiece` before anything is written. The output appears at `output`
/// only once all pieces are written; on failure any previous file there is
/// left as it was.
///
/// Piece contents are not re-hashed here. Callers are expected to have
/// verified them already, e.g. with [`crate::reader::read_piece`] or
/// [`crate::reader::verify_piece`].
pub fn merge<P: AsRef<Path>>(
    descriptor: &TorrentDescriptor,
    output: P,
    pieces: &HashMap<usize, Vec<u8>>,
) -> Result<()> {
    let ordered = (0..descriptor.num_pieces())
        .map(|i| pieces.get(&i).ok_or(TorrentError::MissingPiece(i)))
        .collect::<Result<Vec<_>>>()?;

    let output = output.as_ref();
    write_atomic(output, |w| {
        for piece in &ordered {
            w.write_all(piece.as_slice())?;
        }
        Ok(())
    })?;

    info!(
        output = %output.display(),
        pieces = ordered.len(),
        bytes = ordered.iter().map(|p| p.len()).sum::<usize>(),
        "merged pieces"
    );
    Ok(())
}
