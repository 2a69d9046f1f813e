//! Integers of arbitrary size.

use std::fmt;
use bytes::Bytes;
use crate::util::hex;


//------------ Integer -------------------------------------------------------

/// An INTEGER of arbitrary precision.
///
/// The value is kept in the form it is encoded in: as big-endian two’s
/// complement octets of minimal length. All constructors normalize their
/// input, so a value of this type is always a valid DER content.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Integer(Bytes);

impl Integer {
    /// Creates an integer from big-endian two’s complement octets.
    ///
    /// Redundant leading octets are removed. An empty slice is zero.
    pub fn from_signed_bytes(octets: &[u8]) -> Self {
        if octets.is_empty() {
            return Integer(Bytes::from_static(b"\x00"))
        }
        let mut start = 0;
        while start + 1 < octets.len() {
            let redundant = match octets[start] {
                0x00 => octets[start + 1] & 0x80 == 0,
                0xFF => octets[start + 1] & 0x80 != 0,
                _ => false
            };
            if !redundant {
                break
            }
            start += 1;
        }
        Integer(Bytes::copy_from_slice(&octets[start..]))
    }

    /// Creates a non-negative integer from big-endian unsigned octets.
    pub fn from_unsigned_bytes(octets: &[u8]) -> Self {
        let start = octets.iter().position(|&ch| ch != 0);
        let octets = match start {
            Some(start) => &octets[start..],
            None => return Integer(Bytes::from_static(b"\x00"))
        };
        if octets[0] & 0x80 != 0 {
            let mut res = Vec::with_capacity(octets.len() + 1);
            res.push(0);
            res.extend_from_slice(octets);
            Integer(res.into())
        }
        else {
            Integer(Bytes::copy_from_slice(octets))
        }
    }

    /// Creates an integer from the content octets of an encoded value.
    ///
    /// Returns `None` if the content is empty or, if `strict`, if it isn’t
    /// minimal. Without `strict`, redundant leading octets are dropped.
    pub(crate) fn from_content(content: Bytes, strict: bool) -> Option<Self> {
        if content.is_empty() {
            return None
        }
        let res = Integer::from_signed_bytes(&content);
        if res.0.len() != content.len() {
            if strict {
                return None
            }
            return Some(res)
        }
        Some(Integer(content))
    }

    /// Returns the minimal two’s complement octets.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn is_negative(&self) -> bool {
        self.0[0] & 0x80 != 0
    }

    pub fn is_zero(&self) -> bool {
        self.0.as_ref() == b"\x00"
    }

    /// Returns the value as an `i128` if it fits.
    pub fn to_i128(&self) -> Option<i128> {
        if self.0.len() > 16 {
            return None
        }
        let mut buf = if self.is_negative() { [0xFF; 16] } else { [0; 16] };
        buf[16 - self.0.len()..].copy_from_slice(&self.0);
        Some(i128::from_be_bytes(buf))
    }

    /// Returns the value as an `i64` if it fits.
    pub fn to_i64(&self) -> Option<i64> {
        self.to_i128().and_then(|value| {
            if value < i128::from(i64::MIN) || value > i128::from(i64::MAX) {
                None
            }
            else {
                Some(value as i64)
            }
        })
    }

    /// Returns the value as a `u64` if it is non-negative and fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.to_i128().and_then(|value| {
            if value < 0 || value > i128::from(u64::MAX) {
                None
            }
            else {
                Some(value as u64)
            }
        })
    }
}


//--- From

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::from_signed_bytes(&value.to_be_bytes())
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        Integer::from(i64::from(value))
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Integer::from_unsigned_bytes(&value.to_be_bytes())
    }
}

impl From<u128> for Integer {
    fn from(value: u128) -> Self {
        Integer::from_unsigned_bytes(&value.to_be_bytes())
    }
}


//--- Display and Debug

impl fmt::Display for Integer {
    /// Small values are shown in decimal, large ones as hex digits.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_i128() {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "0x{}", hex::encode_string(self.as_slice()))
        }
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Integer({})", self)
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalizes() {
        assert_eq!(Integer::from(0i64).as_slice(), b"\x00");
        assert_eq!(Integer::from(127i64).as_slice(), b"\x7f");
        assert_eq!(Integer::from(128i64).as_slice(), b"\x00\x80");
        assert_eq!(Integer::from(-1i64).as_slice(), b"\xff");
        assert_eq!(Integer::from(-128i64).as_slice(), b"\x80");
        assert_eq!(Integer::from(-129i64).as_slice(), b"\xff\x7f");
        assert_eq!(Integer::from(u64::MAX).as_slice(), b"\x00\xff\xff\xff\xff\xff\xff\xff\xff");
        assert_eq!(Integer::from_unsigned_bytes(b"\x00\x00").as_slice(), b"\x00");
        assert_eq!(Integer::from_signed_bytes(b"").as_slice(), b"\x00");
    }

    #[test]
    fn from_content() {
        assert!(Integer::from_content(Bytes::from_static(b""), true).is_none());
        assert!(
            Integer::from_content(Bytes::from_static(b"\x00\x7f"), true)
                .is_none()
        );
        assert!(
            Integer::from_content(Bytes::from_static(b"\xff\x80"), true)
                .is_none()
        );
        assert_eq!(
            Integer::from_content(Bytes::from_static(b"\x00\x7f"), false)
                .unwrap().as_slice(),
            b"\x7f"
        );
        assert_eq!(
            Integer::from_content(Bytes::from_static(b"\x00\x80"), true)
                .unwrap().to_i64(),
            Some(128)
        );
    }

    #[test]
    fn conversions() {
        assert_eq!(Integer::from(-300i64).to_i64(), Some(-300));
        assert_eq!(Integer::from(-300i64).to_u64(), None);
        assert_eq!(Integer::from(u64::MAX).to_u64(), Some(u64::MAX));
        assert_eq!(Integer::from(u64::MAX).to_i64(), None);
        let big = Integer::from_unsigned_bytes(&[0xAB; 20]);
        assert_eq!(big.to_i128(), None);
        assert_eq!(big.to_string(), format!("0x00{}", "AB".repeat(20)));
        assert_eq!(Integer::from(-5i64).to_string(), "-5");
    }
}
