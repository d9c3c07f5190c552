use super::bencode::Bencode;
use super::error::BencodeError;
use std::collections::BTreeMap;

const MAX_DEPTH: usize = 32;

/// Decodes exactly one bencode value from `input`.
///
/// Bytes left over after the value are rejected with
/// [`BencodeError::TrailingData`]: a descriptor file holds a single value.
pub fn decode(input: &[u8]) -> Result<Bencode, BencodeError> {
    let mut pos = 0;
    let value = decode_value(input, &mut pos, 0)?;
    if pos != input.len() {
        return Err(BencodeError::TrailingData(pos));
    }
    Ok(value)
}

fn decode_value(input: &[u8], pos: &mut usize, depth: usize) -> Result<Bencode, BencodeError> {
    if depth > MAX_DEPTH {
        return Err(BencodeError::NestingTooDeep(*pos));
    }
    if *pos >= input.len() {
        return Err(BencodeError::UnexpectedEof(*pos));
    }
    match input[*pos] {
        b'i' => decode_int(input, pos),
        b'l' => {
            *pos += 1;
            let mut list = Vec::new();
            while *pos < input.len() && input[*pos] != b'e' {
                list.push(decode_value(input, pos, depth + 1)?);
            }
            if *pos >= input.len() {
                return Err(BencodeError::UnexpectedEof(*pos));
            }
            *pos += 1;
            Ok(Bencode::List(list))
        }
        b'd' => decode_dict(input, pos, depth),
        b'0'..=b'9' => decode_bytes(input, pos).map(Bencode::Bytes),
        c => Err(BencodeError::UnexpectedChar {
            ch: c as char,
            pos: *pos,
        }),
    }
}

/// Reads up to `terminator`, returning the bytes before it. Callers check
/// that they are digits and refuse leading zeros, so every number has exactly
/// one spelling.
fn read_digits<'a>(
    input: &'a [u8],
    pos: &mut usize,
    terminator: u8,
) -> Result<&'a [u8], BencodeError> {
    let start = *pos;
    while *pos < input.len() && input[*pos] != terminator {
        *pos += 1;
    }
    if *pos >= input.len() {
        return Err(BencodeError::UnexpectedEof(*pos));
    }
    Ok(&input[start..*pos])
}

fn decode_int(input: &[u8], pos: &mut usize) -> Result<Bencode, BencodeError> {
    *pos += 1;
    let start = *pos;
    let digits = read_digits(input, pos, b'e')?;
    let invalid = |reason: &str| BencodeError::InvalidInteger {
        pos: start,
        reason: reason.to_string(),
    };

    if digits.is_empty() {
        return Err(invalid("empty"));
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid("non-digit byte"));
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return Err(invalid("leading zeros"));
    }
    // Only ASCII digits remain, so the UTF-8 conversion cannot fail.
    let num = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| invalid("out of range"))?;
    *pos += 1;
    Ok(Bencode::Int(num))
}

fn decode_bytes(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, BencodeError> {
    let start = *pos;
    let digits = read_digits(input, pos, b':')?;
    if digits.is_empty()
        || !digits.iter().all(u8::is_ascii_digit)
        || (digits.len() > 1 && digits[0] == b'0')
    {
        return Err(BencodeError::InvalidStringLength(start));
    }
    let len = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or(BencodeError::InvalidStringLength(start))?;
    *pos += 1;

    let end = pos
        .checked_add(len)
        .filter(|&end| end <= input.len())
        .ok_or(BencodeError::UnexpectedEof(input.len()))?;
    let bytes = input[*pos..end].to_vec();
    *pos = end;
    Ok(bytes)
}

fn decode_dict(input: &[u8], pos: &mut usize, depth: usize) -> Result<Bencode, BencodeError> {
    *pos += 1;
    let mut dict = BTreeMap::new();
    while *pos < input.len() && input[*pos] != b'e' {
        let key_pos = *pos;
        if !input[key_pos].is_ascii_digit() {
            return Err(BencodeError::NonStringKey(key_pos));
        }
        let key = decode_bytes(input, pos)?;
        let val = decode_value(input, pos, depth + 1)?;
        if dict.contains_key(&key) {
            return Err(BencodeError::DuplicateKey {
                key: String::from_utf8_lossy(&key).into_owned(),
                pos: key_pos,
            });
        }
        dict.insert(key, val);
    }
    if *pos >= input.len() {
        return Err(BencodeError::UnexpectedEof(*pos));
    }
    *pos += 1;
    Ok(Bencode::Dict(dict))
}
