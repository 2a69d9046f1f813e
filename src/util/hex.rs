//! Converting from and to hex strings.

use std::str;


/// Encodes a octet sequence as a hex string.
///
/// The function uses `dest` as the buffer for encoding which therefore must
/// be exactly twice the length of `src`. It returns a reference to this
/// buffer as a `&str`.
///
/// # Panics
///
/// The function panics if `dest` is shorter than twice the length of `src`.
pub fn encode<'a>(src: &[u8], dest: &'a mut [u8]) -> &'a str {
    let dest = &mut dest[..src.len() * 2];
    for (s, d) in src.iter().zip(dest.chunks_mut(2)) {
        d[0] = DIGITS[usize::from(s >> 4)];
        d[1] = DIGITS[usize::from(s & 0x0F)];
    }
    unsafe { str::from_utf8_unchecked(dest) }
}

/// Encodes a octet sequence into a newly allocated upper case hex string.
pub fn encode_string(src: &[u8]) -> String {
    let mut res = vec![0u8; src.len() * 2];
    encode(src, &mut res);
    unsafe { String::from_utf8_unchecked(res) }
}

/// Decodes a hex string into octets.
///
/// Accepts both upper and lower case digits. Returns `None` if the string
/// has an odd length or contains anything but hex digits.
pub fn decode(src: &str) -> Option<Vec<u8>> {
    let src = src.as_bytes();
    if src.len() % 2 != 0 {
        return None
    }
    src.chunks(2).map(|pair| {
        Some((decode_digit(pair[0])? << 4) | decode_digit(pair[1])?)
    }).collect()
}

fn decode_digit(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None
    }
}

const DIGITS: &[u8] = b"0123456789ABCDEF";


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_and_decode() {
        assert_eq!(encode_string(b"\x00\x7f\xab"), "007FAB");
        assert_eq!(encode_string(b""), "");
        assert_eq!(decode("007fAB").unwrap(), b"\x00\x7f\xab");
        assert!(decode("0").is_none());
        assert!(decode("zz").is_none());
    }
}
