//! The fixed descriptor schema and its mapping onto bencode values.
//!
//! A descriptor file is a dictionary with an `announce` string and an `info`
//! dictionary holding `length`, `name`, `piece length` and `pieces` (the raw
//! 20-byte piece digests concatenated in index order).

use std::collections::BTreeMap;

use crate::bencoding::{Bencode, HASH_LEN, Sha1Hash, decode, encode, sha1_digest};
use crate::error::{Result, TorrentError};

const KEY_ANNOUNCE: &[u8] = b"announce";
const KEY_INFO: &[u8] = b"info";
const KEY_LENGTH: &[u8] = b"length";
const KEY_NAME: &[u8] = b"name";
const KEY_PIECE_LENGTH: &[u8] = b"piece length";
const KEY_PIECES: &[u8] = b"pieces";

/// The `info` dictionary: every field that defines the described content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoDictionary {
    pub piece_length: u64,
    pub length: u64,
    pub name: String,
    /// Piece digests, flattened.
    pub pieces: Vec<u8>,
}

impl InfoDictionary {
    pub fn to_bencode(&self) -> Bencode {
        let mut dict = BTreeMap::new();
        dict.insert(KEY_LENGTH.to_vec(), Bencode::Int(self.length));
        dict.insert(KEY_NAME.to_vec(), Bencode::string(&self.name));
        dict.insert(KEY_PIECE_LENGTH.to_vec(), Bencode::Int(self.piece_length));
        dict.insert(KEY_PIECES.to_vec(), Bencode::Bytes(self.pieces.clone()));
        Bencode::Dict(dict)
    }

    /// Reads the schema fields out of a decoded `info` value. Unknown keys
    /// are ignored.
    pub fn from_bencode(value: &Bencode) -> Result<Self> {
        if value.as_dict().is_none() {
            return Err(TorrentError::MalformedInput(format!(
                "info must be a dictionary, found {}",
                value.kind()
            )));
        }

        let pieces = match value.get(KEY_PIECES) {
            Some(Bencode::Bytes(b)) => b.clone(),
            other => return Err(field_error("pieces", "string", other)),
        };
        let piece_length = match value.get(KEY_PIECE_LENGTH) {
            Some(Bencode::Int(i)) => *i,
            other => return Err(field_error("piece length", "integer", other)),
        };
        let length = match value.get(KEY_LENGTH) {
            Some(Bencode::Int(i)) => *i,
            other => return Err(field_error("length", "integer", other)),
        };
        let name = utf8_field(value.get(KEY_NAME), "name")?;

        Ok(Self {
            piece_length,
            length,
            name,
            pieces,
        })
    }

    /// Canonical bytes of this dictionary; the input to the info hash.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(encode(&self.to_bencode())?)
    }

    /// SHA-1 over the canonical encoding.
    pub fn info_hash(&self) -> Result<Sha1Hash> {
        Ok(sha1_digest(&self.encode()?))
    }

    /// Splits `pieces` into individual digests.
    ///
    /// A length that is not a multiple of 20 is malformed; it is never
    /// truncated or padded.
    pub fn piece_hashes(&self) -> Result<Vec<Sha1Hash>> {
        if self.pieces.len() % HASH_LEN != 0 {
            return Err(TorrentError::MalformedInput(format!(
                "received malformed pieces of length {}",
                self.pieces.len()
            )));
        }
        Ok(self
            .pieces
            .chunks_exact(HASH_LEN)
            .map(|chunk| {
                let mut hash = [0u8; HASH_LEN];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect())
    }
}

/// The whole descriptor file: announce URL plus the info dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaInfo {
    pub announce: String,
    pub info: InfoDictionary,
}

impl MetaInfo {
    pub fn to_bencode(&self) -> Bencode {
        let mut dict = BTreeMap::new();
        dict.insert(KEY_ANNOUNCE.to_vec(), Bencode::string(&self.announce));
        dict.insert(KEY_INFO.to_vec(), self.info.to_bencode());
        Bencode::Dict(dict)
    }

    pub fn from_bencode(root: &Bencode) -> Result<Self> {
        if root.as_dict().is_none() {
            return Err(TorrentError::MalformedInput(format!(
                "torrent file root is not a dictionary, found {}",
                root.kind()
            )));
        }
        let announce = utf8_field(root.get(KEY_ANNOUNCE), "announce")?;
        let info = match root.get(KEY_INFO) {
            Some(info) => InfoDictionary::from_bencode(info)?,
            None => return Err(field_error("info", "dictionary", None)),
        };
        Ok(Self { announce, info })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(encode(&self.to_bencode())?)
    }

    /// Strictly decodes a complete descriptor file.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let root = decode(bytes)?;
        Self::from_bencode(&root)
    }
}

fn field_error(field: &str, expected: &str, found: Option<&Bencode>) -> TorrentError {
    match found {
        None => TorrentError::MalformedInput(format!("missing {}", field)),
        Some(v) => TorrentError::MalformedInput(format!(
            "{} must be a {}, found {}",
            field,
            expected,
            v.kind()
        )),
    }
}

fn utf8_field(value: Option<&Bencode>, field: &str) -> Result<String> {
    match value {
        Some(Bencode::Bytes(b)) => String::from_utf8(b.clone())
            .map_err(|_| TorrentError::MalformedInput(format!("{} is not valid UTF-8", field))),
        other => Err(field_error(field, "string", other)),
    }
}
