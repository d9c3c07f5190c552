//! Core library for describing files as hashed pieces.
//!
//! This library builds, encodes and decodes single-file `.torrent`
//! descriptors, reads and verifies individual pieces against a source file,
//! and merges a complete piece set back into a file.

pub mod atomic;
pub mod bencoding;
pub mod error;
pub mod index;
pub mod merger;
pub mod metainfo;
pub mod reader;
pub mod splitter;
pub mod torrent;

pub use atomic::write_atomic;
pub use bencoding::{Bencode, BencodeError, Sha1Hash, sha1_digest};
pub use error::{Result, TorrentError};
pub use index::{DescriptorIndex, MemoryIndex, descriptor_path_for, track_descriptor};
pub use merger::merge;
pub use metainfo::{InfoDictionary, MetaInfo};
pub use reader::{PieceStatus, check_piece, check_pieces, read_piece, verify_piece};
pub use splitter::{PieceSplitter, split_file};
pub use torrent::{DEFAULT_PIECE_LENGTH, TorrentDescriptor};

use std::path::Path;

/// Parses a `.torrent` file from the disk.
///
/// # Arguments
///
/// * `path` - The path to the torrent file.
pub fn parse_torrent<P: AsRef<Path>>(path: P) -> Result<TorrentDescriptor> {
    TorrentDescriptor::load(path)
}

/// Parses a torrent from a byte slice.
///
/// # Arguments
///
/// * `buf` - The byte slice containing the bencoded torrent data.
pub fn parse_torrent_from_bytes(buf: &[u8]) -> Result<TorrentDescriptor> {
    TorrentDescriptor::from_bytes(buf)
}
