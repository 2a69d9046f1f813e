//! The identifier octets of an encoded value.

use std::fmt;
use super::decode::{DecodeError, DecodeErrorKind};


//------------ Class ---------------------------------------------------------

/// The class of a tag.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Class {
    Universal,
    Application,
    Context,
    Private,
}

impl Class {
    fn from_bits(bits: u8) -> Self {
        match bits >> 6 {
            0 => Class::Universal,
            1 => Class::Application,
            2 => Class::Context,
            _ => Class::Private,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Class::Universal => 0x00,
            Class::Application => 0x40,
            Class::Context => 0x80,
            Class::Private => 0xC0,
        }
    }
}


//------------ Tag -----------------------------------------------------------

/// The tag of an encoded value.
///
/// A tag consists of a class and a number. Whether the value is
/// constructed or primitive is part of the identifier octets, too, but is
/// kept separately as it describes the encoding rather than the type.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag {
    class: Class,
    number: u32,
}

/// The largest tag number that fits into the short form.
const SHORT_FORM_LIMIT: u32 = 0x1E;

const CONSTRUCTED: u8 = 0x20;

impl Tag {
    pub const BOOLEAN: Self = Tag::universal(1);
    pub const INTEGER: Self = Tag::universal(2);
    pub const BIT_STRING: Self = Tag::universal(3);
    pub const OCTET_STRING: Self = Tag::universal(4);
    pub const NULL: Self = Tag::universal(5);
    pub const OID: Self = Tag::universal(6);
    pub const UTF8_STRING: Self = Tag::universal(12);
    pub const SEQUENCE: Self = Tag::universal(16);
    pub const SET: Self = Tag::universal(17);
    pub const PRINTABLE_STRING: Self = Tag::universal(19);
    pub const IA5_STRING: Self = Tag::universal(22);
    pub const UTC_TIME: Self = Tag::universal(23);
    pub const GENERALIZED_TIME: Self = Tag::universal(24);

    pub const CTX_0: Self = Tag::ctx(0);
    pub const CTX_1: Self = Tag::ctx(1);
    pub const CTX_2: Self = Tag::ctx(2);
    pub const CTX_3: Self = Tag::ctx(3);

    pub const fn new(class: Class, number: u32) -> Self {
        Tag { class, number }
    }

    pub const fn universal(number: u32) -> Self {
        Tag::new(Class::Universal, number)
    }

    pub const fn ctx(number: u32) -> Self {
        Tag::new(Class::Context, number)
    }

    pub fn class(self) -> Class {
        self.class
    }

    pub fn number(self) -> u32 {
        self.number
    }

    /// Parses the identifier octets at the start of `data`.
    ///
    /// Returns the tag, whether the value is constructed, and the number of
    /// octets consumed. Tag numbers above 30 use the multi-octet form which
    /// DER requires to be minimal: the first subsequent octet must not be
    /// `0x80` and the number must not fit the short form.
    pub fn take_from(
        data: &[u8], pos: usize
    ) -> Result<(Self, bool, usize), DecodeError> {
        let first = match data.first() {
            Some(first) => *first,
            None => return Err(DecodeError::new(DecodeErrorKind::Truncated, pos))
        };
        let class = Class::from_bits(first);
        let constructed = first & CONSTRUCTED != 0;
        if first & 0x1F != 0x1F {
            return Ok((
                Tag::new(class, u32::from(first & 0x1F)), constructed, 1
            ))
        }
        let mut number: u32 = 0;
        let mut idx = 1;
        loop {
            let octet = match data.get(idx) {
                Some(octet) => *octet,
                None => {
                    return Err(DecodeError::new(
                        DecodeErrorKind::Truncated, pos + idx
                    ))
                }
            };
            if idx == 1 && octet == 0x80 {
                return Err(DecodeError::malformed(
                    "non-minimal tag number", pos + idx
                ))
            }
            if number.leading_zeros() < 7 {
                return Err(DecodeError::malformed(
                    "tag number too large", pos + idx
                ))
            }
            number = (number << 7) | u32::from(octet & 0x7F);
            idx += 1;
            if octet & 0x80 == 0 {
                break
            }
        }
        if number <= SHORT_FORM_LIMIT {
            return Err(DecodeError::malformed(
                "non-minimal tag number", pos
            ))
        }
        Ok((Tag::new(class, number), constructed, idx))
    }

    /// Appends the identifier octets for this tag to `target`.
    pub fn write_encoded(self, constructed: bool, target: &mut Vec<u8>) {
        let mut first = self.class.to_bits();
        if constructed {
            first |= CONSTRUCTED
        }
        if self.number <= SHORT_FORM_LIMIT {
            target.push(first | self.number as u8);
            return
        }
        target.push(first | 0x1F);
        let mut buf = [0u8; 5];
        let mut pos = buf.len() - 1;
        let mut number = self.number;
        buf[pos] = (number & 0x7F) as u8;
        number >>= 7;
        while number > 0 {
            pos -= 1;
            buf[pos] = (number & 0x7F) as u8 | 0x80;
            number >>= 7;
        }
        target.extend_from_slice(&buf[pos..]);
    }
}


//--- Display and Debug

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Tag::BOOLEAN => f.write_str("BOOLEAN"),
            Tag::INTEGER => f.write_str("INTEGER"),
            Tag::BIT_STRING => f.write_str("BIT STRING"),
            Tag::OCTET_STRING => f.write_str("OCTET STRING"),
            Tag::NULL => f.write_str("NULL"),
            Tag::OID => f.write_str("OBJECT IDENTIFIER"),
            Tag::UTF8_STRING => f.write_str("UTF8String"),
            Tag::SEQUENCE => f.write_str("SEQUENCE"),
            Tag::SET => f.write_str("SET"),
            Tag::PRINTABLE_STRING => f.write_str("PrintableString"),
            Tag::IA5_STRING => f.write_str("IA5String"),
            Tag::UTC_TIME => f.write_str("UTCTime"),
            Tag::GENERALIZED_TIME => f.write_str("GeneralizedTime"),
            Tag { class, number } => {
                match class {
                    Class::Universal => write!(f, "[UNIVERSAL {}]", number),
                    Class::Application => {
                        write!(f, "[APPLICATION {}]", number)
                    }
                    Class::Context => write!(f, "[{}]", number),
                    Class::Private => write!(f, "[PRIVATE {}]", number),
                }
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn encoded(tag: Tag, constructed: bool) -> Vec<u8> {
        let mut target = Vec::new();
        tag.write_encoded(constructed, &mut target);
        target
    }

    #[test]
    fn short_form() {
        assert_eq!(encoded(Tag::SEQUENCE, true), b"\x30");
        assert_eq!(encoded(Tag::INTEGER, false), b"\x02");
        assert_eq!(encoded(Tag::CTX_3, true), b"\xa3");
        assert_eq!(
            Tag::take_from(b"\xa3\x00", 0).unwrap(),
            (Tag::CTX_3, true, 1)
        );
        assert_eq!(
            Tag::take_from(b"\x82", 0).unwrap(),
            (Tag::ctx(2), false, 1)
        );
    }

    #[test]
    fn long_form() {
        let tag = Tag::new(Class::Application, 31);
        assert_eq!(encoded(tag, false), b"\x5f\x1f");
        assert_eq!(Tag::take_from(b"\x5f\x1f", 0).unwrap(), (tag, false, 2));

        let tag = Tag::ctx(200);
        assert_eq!(encoded(tag, true), b"\xbf\x81\x48");
        assert_eq!(
            Tag::take_from(b"\xbf\x81\x48", 0).unwrap(), (tag, true, 3)
        );
    }

    #[test]
    fn malformed() {
        assert!(Tag::take_from(b"", 0).is_err());
        assert!(Tag::take_from(b"\x1f", 0).is_err());
        assert!(Tag::take_from(b"\x1f\x81", 0).is_err());
        assert!(Tag::take_from(b"\x1f\x80\x01", 0).is_err());
        assert!(Tag::take_from(b"\x1f\x05", 0).is_err());
    }
}
