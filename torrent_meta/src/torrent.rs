use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::atomic::write_atomic;
use crate::bencoding::{HASH_LEN, Sha1Hash, sha1_digest};
use crate::error::{Result, TorrentError};
use crate::metainfo::{InfoDictionary, MetaInfo};
use crate::splitter::split_file;

/// Piece size used when the caller has no preference (256 KiB).
pub const DEFAULT_PIECE_LENGTH: u64 = 256 * 1024;

/// Immutable metadata describing one file as a sequence of hashed pieces.
///
/// The info hash is always derived from the other fields by re-encoding the
/// info dictionary; it is never taken from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentDescriptor {
    announce: String,
    info_hash: Sha1Hash,
    piece_hashes: Vec<Sha1Hash>,
    piece_length: u64,
    length: u64,
    name: String,
}

impl TorrentDescriptor {
    /// Splits and hashes the file at `path` into a new descriptor.
    ///
    /// The descriptor's `name` is the file's base name and `length` its size.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if `piece_length` is zero or the path has no
    ///   UTF-8 base name.
    /// * `Io` if the file cannot be read, or changes size while being read.
    pub fn create<P: AsRef<Path>>(path: P, announce: &str, piece_length: u64) -> Result<Self> {
        let path = path.as_ref();
        if piece_length == 0 {
            return Err(TorrentError::InvalidArgument(
                "piece length must be positive".to_string(),
            ));
        }
        let chunk_len = usize::try_from(piece_length).map_err(|_| {
            TorrentError::InvalidArgument(format!("piece length {} is too large", piece_length))
        })?;

        let length = fs::metadata(path)?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                TorrentError::InvalidArgument(format!(
                    "{} has no UTF-8 file name",
                    path.display()
                ))
            })?
            .to_string();

        let capacity = usize::try_from(length.div_ceil(piece_length))
            .ok()
            .and_then(|n| n.checked_mul(HASH_LEN))
            .unwrap_or(0);
        let mut pieces = Vec::with_capacity(capacity);
        let mut read_total = 0u64;
        for (index, chunk) in split_file(path, chunk_len)?.enumerate() {
            let chunk = chunk?;
            read_total += chunk.len() as u64;
            let hash = sha1_digest(&chunk);
            debug!(index, size = chunk.len(), "hashed piece");
            pieces.extend_from_slice(&hash);
        }
        if read_total != length {
            return Err(TorrentError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "{} changed while hashing: expected {} bytes, read {}",
                    path.display(),
                    length,
                    read_total
                ),
            )));
        }

        let descriptor = Self::from_meta_info(MetaInfo {
            announce: announce.to_string(),
            info: InfoDictionary {
                piece_length,
                length,
                name,
                pieces,
            },
        })?;
        info!(
            name = %descriptor.name,
            pieces = descriptor.num_pieces(),
            info_hash = %descriptor.info_hash_hex(),
            "created descriptor"
        );
        Ok(descriptor)
    }

    /// Decodes a descriptor from its encoded form.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if the bytes break the schema, if `pieces` is not a
    /// whole number of digests, or if `piece length` is zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_meta_info(MetaInfo::decode(bytes)?)
    }

    /// Reads and decodes a descriptor file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    fn from_meta_info(meta: MetaInfo) -> Result<Self> {
        let MetaInfo { announce, info } = meta;
        if info.piece_length == 0 {
            return Err(TorrentError::MalformedInput(
                "piece length must be positive".to_string(),
            ));
        }
        let piece_hashes = info.piece_hashes()?;
        let info_hash = info.info_hash()?;
        Ok(Self {
            announce,
            info_hash,
            piece_hashes,
            piece_length: info.piece_length,
            length: info.length,
            name: info.name,
        })
    }

    /// Rebuilds the info dictionary from the descriptor's fields.
    pub fn info_dictionary(&self) -> InfoDictionary {
        InfoDictionary {
            piece_length: self.piece_length,
            length: self.length,
            name: self.name.clone(),
            pieces: self.piece_hashes.concat(),
        }
    }

    pub fn to_meta_info(&self) -> MetaInfo {
        MetaInfo {
            announce: self.announce.clone(),
            info: self.info_dictionary(),
        }
    }

    /// Canonical encoded form, suitable for writing to a `.torrent` file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_meta_info().encode()
    }

    /// Writes the encoded descriptor to `path`, replacing it atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_atomic(path, |w| w.write_all(&bytes))?;
        Ok(())
    }

    pub fn announce(&self) -> &str {
        &self.announce
    }

    pub fn info_hash(&self) -> &Sha1Hash {
        &self.info_hash
    }

    pub fn info_hash_hex(&self) -> String {
        hex::encode(self.info_hash)
    }

    pub fn piece_hashes(&self) -> &[Sha1Hash] {
        &self.piece_hashes
    }

    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_pieces(&self) -> usize {
        self.piece_hashes.len()
    }

    /// Byte offset of piece `index` within the file.
    pub fn piece_offset(&self, index: usize) -> Result<u64> {
        self.check_index(index)?;
        (index as u64)
            .checked_mul(self.piece_length)
            .ok_or_else(|| TorrentError::MalformedInput(format!("piece {} offset overflows", index)))
    }

    /// Expected size of piece `index`.
    ///
    /// Every piece but the last is `piece_length` long. The last one covers
    /// whatever `length` leaves; if that is zero, negative or larger than
    /// `piece_length`, the descriptor is inconsistent and `MalformedInput`
    /// is returned.
    pub fn piece_size(&self, index: usize) -> Result<u64> {
        let offset = self.piece_offset(index)?;
        if index + 1 < self.num_pieces() {
            if offset.saturating_add(self.piece_length) > self.length {
                return Err(TorrentError::MalformedInput(format!(
                    "piece {} lies beyond length {}",
                    index, self.length
                )));
            }
            return Ok(self.piece_length);
        }
        match self.length.checked_sub(offset) {
            Some(size) if size > 0 && size <= self.piece_length => Ok(size),
            _ => Err(TorrentError::MalformedInput(format!(
                "last piece size is invalid: length {} with {} pieces of {} bytes",
                self.length,
                self.num_pieces(),
                self.piece_length
            ))),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.num_pieces() {
            return Err(TorrentError::InvalidArgument(format!(
                "invalid piece index {} (descriptor has {} pieces)",
                index,
                self.num_pieces()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_create_600k_file() {
        let dir = tempdir().unwrap();
        let data = patterned(600_000);
        let path = write_file(dir.path(), "movie.bin", &data);

        let t = TorrentDescriptor::create(&path, "http://tracker.test/announce", 262_144).unwrap();
        assert_eq!(t.name(), "movie.bin");
        assert_eq!(t.length(), 600_000);
        assert_eq!(t.num_pieces(), 3);
        assert_eq!(t.piece_hashes()[0], sha1_digest(&data[..262_144]));
        assert_eq!(t.piece_hashes()[2], sha1_digest(&data[524_288..]));
        assert_eq!(t.piece_size(0).unwrap(), 262_144);
        assert_eq!(t.piece_size(1).unwrap(), 262_144);
        assert_eq!(t.piece_size(2).unwrap(), 75_712);

        let reloaded = TorrentDescriptor::from_bytes(&t.to_bytes().unwrap()).unwrap();
        assert_eq!(reloaded, t);
        assert_eq!(reloaded.info_hash(), t.info_hash());
    }

    #[test]
    fn test_info_hash_ignores_announce() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", b"hello world");
        let a = TorrentDescriptor::create(&path, "http://one", 4).unwrap();
        let b = TorrentDescriptor::create(&path, "http://two", 4).unwrap();
        assert_eq!(a.info_hash(), b.info_hash());
        assert_ne!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn test_info_hash_matches_encoded_info() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", b"hello world");
        let t = TorrentDescriptor::create(&path, "http://one", 4).unwrap();
        let expected = sha1_digest(&t.info_dictionary().encode().unwrap());
        assert_eq!(t.info_hash(), &expected);
    }

    #[test]
    fn test_create_empty_file() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "empty", b"");
        let t = TorrentDescriptor::create(&path, "http://t", 16).unwrap();
        assert_eq!(t.num_pieces(), 0);
        assert_eq!(t.length(), 0);
        assert!(matches!(
            t.piece_size(0),
            Err(TorrentError::InvalidArgument(_))
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_create_piece_length_beyond_file_size() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "tiny", b"abcd");
        let t = TorrentDescriptor::create(&path, "http://t", 1 << 46).unwrap();
        assert_eq!(t.num_pieces(), 1);
        assert_eq!(t.piece_hashes()[0], sha1_digest(b"abcd"));
        assert_eq!(t.piece_size(0).unwrap(), 4);
    }

    #[test]
    fn test_create_errors() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a", b"abc");
        assert!(matches!(
            TorrentDescriptor::create(&path, "http://t", 0),
            Err(TorrentError::InvalidArgument(_))
        ));
        assert!(matches!(
            TorrentDescriptor::create(dir.path().join("missing"), "http://t", 4),
            Err(TorrentError::Io(_))
        ));
    }

    #[test]
    fn test_load_rejects_partial_digest() {
        let mut bytes = b"d8:announce1:a4:infod6:lengthi10e4:name1:n12:piece lengthi10e6:pieces25:".to_vec();
        bytes.extend_from_slice(&[0u8; 25]);
        bytes.extend_from_slice(b"ee");
        assert!(matches!(
            TorrentDescriptor::from_bytes(&bytes),
            Err(TorrentError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_load_rejects_zero_piece_length() {
        let bytes = b"d8:announce1:a4:infod6:lengthi0e4:name1:n12:piece lengthi0e6:pieces0:ee";
        assert!(matches!(
            TorrentDescriptor::from_bytes(bytes),
            Err(TorrentError::MalformedInput(_))
        ));
    }

    fn inconsistent(length: u64, piece_length: u64, pieces: usize) -> TorrentDescriptor {
        let meta = MetaInfo {
            announce: "http://t".to_string(),
            info: InfoDictionary {
                piece_length,
                length,
                name: "n".to_string(),
                pieces: vec![0u8; pieces * HASH_LEN],
            },
        };
        TorrentDescriptor::from_bytes(&meta.encode().unwrap()).unwrap()
    }

    #[test]
    fn test_piece_size_detects_inconsistent_descriptor() {
        // Last piece would need 80 bytes with a 10 byte piece length.
        let too_long = inconsistent(100, 10, 3);
        assert_eq!(too_long.piece_size(0).unwrap(), 10);
        assert!(matches!(
            too_long.piece_size(2),
            Err(TorrentError::MalformedInput(_))
        ));

        // Last piece would start past the end of the file.
        let too_short = inconsistent(15, 10, 3);
        assert!(matches!(
            too_short.piece_size(1),
            Err(TorrentError::MalformedInput(_))
        ));
        assert!(matches!(
            too_short.piece_size(2),
            Err(TorrentError::MalformedInput(_))
        ));

        // Exactly on the boundary: last piece would be empty.
        let empty_last = inconsistent(20, 10, 3);
        assert!(matches!(
            empty_last.piece_size(2),
            Err(TorrentError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "data.bin", &patterned(1000));
        let t = TorrentDescriptor::create(&path, "http://t", 300).unwrap();

        let torrent_path = dir.path().join("data.bin.torrent");
        t.save(&torrent_path).unwrap();
        let loaded = TorrentDescriptor::load(&torrent_path).unwrap();
        assert_eq!(loaded, t);
        assert_eq!(loaded.announce(), "http://t");
    }
}
