//! A codec for the Distinguished Encoding Rules.
//!
//! DER is the canonical subset of the Basic Encoding Rules of ASN.1 used
//! by X.509. Every value has exactly one valid encoding: lengths are
//! definite and minimal, booleans are `0x00` or `0xFF`, integers are
//! minimal two’s complement, and unused bits of a bit string are zero.
//!
//! Decoding produces a tree of [`Value`]s without any knowledge of the
//! schema of the data. The [`Decoder`] can be used to walk over encoded
//! data value by value instead and to capture the raw encoding of values.
//! An [`Encoder`] turns a value tree back into octets.
//!
//! Since some software out there produces data that is BER but not quite
//! DER, the decoder can be switched to [`Mode::Lenient`] which tolerates
//! the most common deviations.

pub use self::bitstring::BitString;
pub use self::decode::{decode, decode_all, DecodeError, DecodeErrorKind, Decoder};
pub use self::encode::{Encode, EncodeError, Encoder};
pub use self::int::Integer;
pub use self::tag::{Class, Tag};
pub use self::value::{Tagged, Value};

pub mod bitstring;
pub mod decode;
pub mod encode;
pub mod int;
pub mod tag;
pub mod value;


//------------ Mode ----------------------------------------------------------

/// The rules applied when decoding.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Only accept canonical DER.
    Strict,

    /// Tolerate common deviations from DER.
    ///
    /// This accepts non-minimal lengths and integers, booleans other than
    /// `0xFF` for true, non-zero padding bits in bit strings, any ASCII
    /// character in a PrintableString, UTCTime without seconds, and
    /// GeneralizedTime fractions with trailing zeros. Indefinite lengths
    /// are never accepted.
    Lenient,
}

impl Mode {
    pub fn is_strict(self) -> bool {
        matches!(self, Mode::Strict)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Strict
    }
}
