use super::bencode::Bencode;
use super::error::BencodeError;
use std::io::Write;

/// Encodes a value into its canonical byte form.
///
/// Dictionary keys come out sorted by raw bytes (the `BTreeMap` order), so a
/// logical value always maps to the same bytes no matter how it was built.
pub fn encode(value: &Bencode) -> Result<Vec<u8>, BencodeError> {
    let mut buf = Vec::new();
    encode_to(value, &mut buf)?;
    Ok(buf)
}

/// Streams the canonical encoding of `value` into `writer`.
pub fn encode_to<W: Write>(value: &Bencode, writer: &mut W) -> Result<(), BencodeError> {
    match value {
        Bencode::Int(i) => write!(writer, "i{}e", i)?,
        Bencode::Bytes(b) => write_bytes(b, writer)?,
        Bencode::List(list) => {
            writer.write_all(b"l")?;
            for item in list {
                encode_to(item, writer)?;
            }
            writer.write_all(b"e")?;
        }
        Bencode::Dict(dict) => {
            writer.write_all(b"d")?;
            for (key, val) in dict {
                write_bytes(key, writer)?;
                encode_to(val, writer)?;
            }
            writer.write_all(b"e")?;
        }
    }
    Ok(())
}

fn write_bytes<W: Write>(bytes: &[u8], writer: &mut W) -> Result<(), BencodeError> {
    write!(writer, "{}:", bytes.len())?;
    writer.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencoding::decode;
    use std::collections::BTreeMap;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&Bencode::Int(0)).unwrap(), b"i0e");
        assert_eq!(encode(&Bencode::Int(262144)).unwrap(), b"i262144e");
        assert_eq!(encode(&Bencode::string("spam")).unwrap(), b"4:spam");
        assert_eq!(encode(&Bencode::Bytes(Vec::new())).unwrap(), b"0:");
    }

    #[test]
    fn test_encode_list() {
        let list = Bencode::List(vec![Bencode::Int(1), Bencode::string("two")]);
        assert_eq!(encode(&list).unwrap(), b"li1e3:twoe");
    }

    #[test]
    fn test_dict_keys_sorted_regardless_of_insertion() {
        let mut a = BTreeMap::new();
        a.insert(b"pieces".to_vec(), Bencode::string("x"));
        a.insert(b"name".to_vec(), Bencode::string("f"));
        a.insert(b"piece length".to_vec(), Bencode::Int(2));
        a.insert(b"length".to_vec(), Bencode::Int(1));

        let mut b = BTreeMap::new();
        b.insert(b"length".to_vec(), Bencode::Int(1));
        b.insert(b"piece length".to_vec(), Bencode::Int(2));
        b.insert(b"name".to_vec(), Bencode::string("f"));
        b.insert(b"pieces".to_vec(), Bencode::string("x"));

        let encoded = encode(&Bencode::Dict(a)).unwrap();
        assert_eq!(encoded, encode(&Bencode::Dict(b)).unwrap());
        assert_eq!(
            encoded,
            b"d6:lengthi1e4:name1:f12:piece lengthi2e6:pieces1:xe".to_vec()
        );
    }

    #[test]
    fn test_binary_strings_survive() {
        // Bytes that look like structure must not confuse the length prefix.
        let value = Bencode::Bytes(b"e:d4:i1e".to_vec());
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded, b"8:e:d4:i1e");
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_encode_to_writer() {
        let mut out = Vec::new();
        encode_to(&Bencode::Int(7), &mut out).unwrap();
        encode_to(&Bencode::string("ab"), &mut out).unwrap();
        assert_eq!(out, b"i7e2:ab");
    }
}
