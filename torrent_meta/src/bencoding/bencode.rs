use std::collections::BTreeMap;

/// A decoded bencode value.
///
/// Dictionaries are kept in a `BTreeMap` keyed by raw bytes, so iteration
/// order is always the canonical (byte-wise sorted) key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bencode {
    /// A non-negative integer. Signs are not part of the descriptor schema.
    Int(u64),
    Bytes(Vec<u8>),
    List(Vec<Bencode>),
    Dict(BTreeMap<Vec<u8>, Bencode>),
}

impl Bencode {
    /// Builds a byte string value from UTF-8 text.
    pub fn string(s: &str) -> Self {
        Bencode::Bytes(s.as_bytes().to_vec())
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Bencode::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Bencode::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as UTF-8 text, if it is a byte string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, Bencode>> {
        match self {
            Bencode::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up `key` when the value is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&Bencode> {
        self.as_dict().and_then(|d| d.get(key))
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Bencode::Int(_) => "integer",
            Bencode::Bytes(_) => "string",
            Bencode::List(_) => "list",
            Bencode::Dict(_) => "dictionary",
        }
    }
}

impl From<u64> for Bencode {
    fn from(i: u64) -> Self {
        Bencode::Int(i)
    }
}

impl From<&str> for Bencode {
    fn from(s: &str) -> Self {
        Bencode::string(s)
    }
}

impl From<Vec<u8>> for Bencode {
    fn from(b: Vec<u8>) -> Self {
        Bencode::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let mut dict = BTreeMap::new();
        dict.insert(b"name".to_vec(), Bencode::string("file.bin"));
        dict.insert(b"length".to_vec(), Bencode::Int(7));
        let value = Bencode::Dict(dict);

        assert_eq!(value.get(b"name").and_then(Bencode::as_str), Some("file.bin"));
        assert_eq!(value.get(b"length").and_then(Bencode::as_int), Some(7));
        assert!(value.get(b"missing").is_none());
        assert_eq!(value.kind(), "dictionary");
    }

    #[test]
    fn test_as_str_rejects_invalid_utf8() {
        let value = Bencode::Bytes(vec![0xff, 0xfe]);
        assert!(value.as_str().is_none());
        assert_eq!(value.as_bytes(), Some(&[0xff, 0xfe][..]));
    }
}
