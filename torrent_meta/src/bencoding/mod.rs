pub mod bencode;
pub mod decode;
pub mod digest;
pub mod encode;
pub mod error;

pub use bencode::Bencode;
pub use decode::decode;
pub use digest::{HASH_LEN, Sha1Hash, sha1_digest};
pub use encode::{encode, encode_to};
pub use error::BencodeError;
