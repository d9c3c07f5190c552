//! Sequential splitting of a file into fixed-size pieces.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{Result, TorrentError};

/// Lazily yields the pieces of a byte stream.
///
/// Every piece holds exactly `piece_length` bytes except the last, which holds
/// whatever remained. An empty stream yields nothing. Reaching end of stream
/// part way through a piece just shortens that piece; any other read error
/// is yielded once and ends the iteration.
pub struct PieceSplitter<R> {
    reader: R,
    piece_length: usize,
    done: bool,
}

impl<R: Read> PieceSplitter<R> {
    pub fn new(reader: R, piece_length: usize) -> Result<Self> {
        if piece_length == 0 {
            return Err(TorrentError::InvalidArgument(
                "piece length must be positive".to_string(),
            ));
        }
        Ok(Self {
            reader,
            piece_length,
            done: false,
        })
    }

    /// Reads up to one piece, growing the buffer only as bytes arrive.
    fn fill(&mut self, piece: &mut Vec<u8>) -> io::Result<usize> {
        (&mut self.reader)
            .take(self.piece_length as u64)
            .read_to_end(piece)
    }
}

impl<R: Read> Iterator for PieceSplitter<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut piece = Vec::new();
        match self.fill(&mut piece) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(n) => {
                if n < self.piece_length {
                    self.done = true;
                }
                Some(Ok(piece))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Opens `path` and splits it into pieces of `piece_length` bytes.
///
/// Re-opening the file restarts the sequence.
pub fn split_file<P: AsRef<Path>>(
    path: P,
    piece_length: usize,
) -> Result<PieceSplitter<BufReader<File>>> {
    if piece_length == 0 {
        return Err(TorrentError::InvalidArgument(
            "piece length must be positive".to_string(),
        ));
    }
    let file = File::open(path)?;
    PieceSplitter::new(BufReader::new(file), piece_length)
}
