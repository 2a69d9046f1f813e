//! Bit strings.

use std::fmt;
use bytes::Bytes;
use crate::util::hex;


//------------ BitString -----------------------------------------------------

/// A BIT STRING value.
///
/// The bits are kept in octets, most significant bit first, together with
/// the number of bits in the last octet that are not part of the string.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct BitString {
    /// The number of unused bits in the last octet.
    unused: u8,

    /// The octets containing the bits.
    bits: Bytes,
}

impl BitString {
    /// Creates a bit string from its parts.
    ///
    /// Returns `None` if `unused` is larger than 7 or if it is not zero for
    /// an empty string.
    pub fn new(unused: u8, bits: Bytes) -> Option<Self> {
        if unused > 7 || (bits.is_empty() && unused != 0) {
            None
        }
        else {
            Some(BitString { unused, bits })
        }
    }

    /// Creates a bit string consisting of all bits of the given octets.
    pub fn from_octets(bits: impl Into<Bytes>) -> Self {
        BitString { unused: 0, bits: bits.into() }
    }

    /// Returns the number of unused bits in the last octet.
    pub fn unused(&self) -> u8 {
        self.unused
    }

    /// Returns the octets of the bit string.
    pub fn octets(&self) -> &Bytes {
        &self.bits
    }

    /// Returns the octets as a slice.
    pub fn octet_slice(&self) -> &[u8] {
        self.bits.as_ref()
    }

    /// Returns the number of bits in the string.
    pub fn bit_len(&self) -> usize {
        (self.bits.len() * 8).saturating_sub(usize::from(self.unused))
    }

    /// Returns the value of bit number `bit`.
    ///
    /// Bits are counted from the most significant bit of the first octet.
    /// Bits beyond the end of the string are `false`.
    pub fn bit(&self, bit: usize) -> bool {
        if bit >= self.bit_len() {
            return false
        }
        let octet = self.bits[bit / 8];
        octet & (0x80 >> (bit % 8)) != 0
    }

    /// Returns whether all unused bits are zero as DER requires.
    pub fn has_clean_padding(&self) -> bool {
        match self.bits.last() {
            Some(last) => last & ((1u8 << self.unused) - 1) == 0,
            None => true
        }
    }
}


//--- Debug

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f, "BitString({}, unused {})",
            hex::encode_string(self.octet_slice()), self.unused
        )
    }
}


//------------ Tests ---------------------------------------------------------
