pub use sha1::{Digest, Sha1};

/// Size in bytes of a SHA-1 digest.
pub const HASH_LEN: usize = 20;

/// A 160-bit SHA-1 digest.
pub type Sha1Hash = [u8; HASH_LEN];

/// Hashes an arbitrary byte buffer. Used for piece hashes and the info hash alike.
pub fn sha1_digest(bytes: &[u8]) -> Sha1Hash {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(&result);
    hash
}
