//! Decoding DER data into a value tree.

use std::{error, fmt, str};
use bytes::Bytes;
use chrono::NaiveDate;
use crate::oid::Oid;
use crate::x509::Time;
use super::Mode;
use super::bitstring::BitString;
use super::int::Integer;
use super::tag::{Class, Tag};
use super::value::{Tagged, Value};


/// The maximum nesting depth of constructed values.
pub const MAX_DEPTH: usize = 64;

/// The maximum number of octets in a long form length.
const MAX_LENGTH_OCTETS: usize = 8;


//------------ Functions -----------------------------------------------------

/// Decodes a single value that must span all of `data`.
///
/// This uses strict mode.
pub fn decode(data: impl Into<Bytes>) -> Result<Value, DecodeError> {
    let mut decoder = Decoder::new(data);
    let res = decoder.take_value()?;
    decoder.finish()?;
    Ok(res)
}

/// Decodes a sequence of values concatenated in `data`.
pub fn decode_all(
    data: impl Into<Bytes>, mode: Mode
) -> Result<Vec<Value>, DecodeError> {
    let mut decoder = Decoder::with_mode(data, mode);
    let mut res = Vec::new();
    while !decoder.is_empty() {
        res.push(decoder.take_value()?);
    }
    Ok(res)
}


//------------ Decoder -------------------------------------------------------

/// A cursor over DER encoded data.
///
/// Each call to [`take_value`][Self::take_value] decodes the next complete
/// value and advances the cursor past it. Errors carry the offset of the
/// offending octet relative to the start of the original data.
#[derive(Clone, Debug)]
pub struct Decoder {
    /// The data the decoder is working on.
    data: Bytes,

    /// The current position within `data`.
    pos: usize,

    /// The offset of the start of `data` within the original data.
    offset: usize,

    /// Which rules to apply.
    mode: Mode,

    /// The nesting depth of `data`.
    depth: usize,
}

/// The identifier and length octets of a value.
struct Header {
    tag: Tag,
    constructed: bool,

    /// The absolute offset of the first identifier octet.
    start: usize,

    /// The absolute offset of the first content octet.
    content_start: usize,

    content: Bytes,
}

impl Decoder {
    /// Creates a new strict decoder.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_mode(data, Mode::Strict)
    }

    /// Creates a new decoder using the given mode.
    pub fn with_mode(data: impl Into<Bytes>, mode: Mode) -> Self {
        Decoder {
            data: data.into(),
            pos: 0,
            offset: 0,
            mode,
            depth: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the absolute offset of the cursor.
    pub fn position(&self) -> usize {
        self.offset + self.pos
    }

    /// Returns whether all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Checks that all data has been consumed.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.is_empty() {
            Ok(())
        }
        else {
            Err(DecodeError::new(
                DecodeErrorKind::TrailingData, self.position()
            ))
        }
    }

    /// Returns the tag of the next value without advancing.
    pub fn peek_tag(&self) -> Result<Tag, DecodeError> {
        Tag::take_from(&self.data[self.pos..], self.position())
            .map(|(tag, _, _)| tag)
    }

    /// Decodes the next value.
    pub fn take_value(&mut self) -> Result<Value, DecodeError> {
        let header = self.take_header()?;
        self.value_from_header(header)
    }

    /// Decodes the next value if it has the given tag.
    ///
    /// If the value has a different tag, returns a type mismatch error and
    /// leaves the cursor where it was.
    pub fn take_value_if(&mut self, tag: Tag) -> Result<Value, DecodeError> {
        let found = self.peek_tag()?;
        if found != tag {
            return Err(DecodeError::new(
                DecodeErrorKind::TypeMismatch { expected: tag, found },
                self.position()
            ))
        }
        self.take_value()
    }

    /// Returns the complete encoding of the next value.
    ///
    /// Only the identifier and length octets are checked. The content is
    /// not decoded.
    pub fn take_raw(&mut self) -> Result<Bytes, DecodeError> {
        let header = self.take_header()?;
        let start = header.start - self.offset;
        Ok(self.data.slice(start..self.pos))
    }

    /// Returns a decoder for the content of the next value which must be a
    /// SEQUENCE.
    pub fn take_sequence(&mut self) -> Result<Decoder, DecodeError> {
        let pos = self.position();
        let header = self.take_header()?;
        if header.tag != Tag::SEQUENCE {
            return Err(DecodeError::new(
                DecodeErrorKind::TypeMismatch {
                    expected: Tag::SEQUENCE, found: header.tag
                },
                pos
            ))
        }
        if !header.constructed {
            return Err(DecodeError::malformed(
                "primitive encoding of constructed type", pos
            ))
        }
        self.nested(header)
    }

    fn nested(&self, header: Header) -> Result<Decoder, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::new(
                DecodeErrorKind::TooDeep, header.start
            ))
        }
        Ok(Decoder {
            data: header.content,
            pos: 0,
            offset: header.content_start,
            mode: self.mode,
            depth: self.depth + 1,
        })
    }

    fn take_header(&mut self) -> Result<Header, DecodeError> {
        let start = self.position();
        let (tag, constructed, tag_len) = Tag::take_from(
            &self.data[self.pos..], start
        )?;
        let mut pos = self.pos + tag_len;
        let first = match self.data.get(pos) {
            Some(first) => *first,
            None => {
                return Err(DecodeError::new(
                    DecodeErrorKind::Truncated, self.offset + pos
                ))
            }
        };
        let len_pos = self.offset + pos;
        pos += 1;
        let len = if first < 0x80 {
            usize::from(first)
        }
        else if first == 0x80 {
            return Err(DecodeError::new(
                DecodeErrorKind::IndefiniteLength, len_pos
            ))
        }
        else {
            let count = usize::from(first & 0x7F);
            if count > MAX_LENGTH_OCTETS {
                return Err(DecodeError::new(
                    DecodeErrorKind::LengthOverflow, len_pos
                ))
            }
            let octets = match self.data.get(pos..pos + count) {
                Some(octets) => octets,
                None => {
                    return Err(DecodeError::new(
                        DecodeErrorKind::Truncated, len_pos
                    ))
                }
            };
            pos += count;
            let mut len: u64 = 0;
            for &octet in octets {
                len = (len << 8) | u64::from(octet);
            }
            if self.mode.is_strict() && (octets[0] == 0 || len < 0x80) {
                return Err(DecodeError::new(
                    DecodeErrorKind::NonMinimalLength, len_pos
                ))
            }
            if len > usize::MAX as u64 {
                return Err(DecodeError::new(
                    DecodeErrorKind::LengthOverflow, len_pos
                ))
            }
            len as usize
        };
        if self.data.len() - pos < len {
            return Err(DecodeError::new(
                DecodeErrorKind::Truncated, len_pos
            ))
        }
        let content = self.data.slice(pos..pos + len);
        let content_start = self.offset + pos;
        self.pos = pos + len;
        Ok(Header { tag, constructed, start, content_start, content })
    }

    fn value_from_header(
        &self, header: Header
    ) -> Result<Value, DecodeError> {
        if header.tag.class() != Class::Universal {
            return self.tagged_from_header(header)
        }
        let start = header.start;
        match header.tag {
            Tag::SEQUENCE | Tag::SET => {
                if !header.constructed {
                    return Err(DecodeError::malformed(
                        "primitive encoding of constructed type", start
                    ))
                }
                let set = header.tag == Tag::SET;
                let items = self.nested(header)?.take_all()?;
                if set {
                    Ok(Value::Set(items))
                }
                else {
                    Ok(Value::Sequence(items))
                }
            }
            tag => {
                if header.constructed {
                    return Err(DecodeError::malformed(
                        "constructed encoding of primitive type", start
                    ))
                }
                self.primitive(tag, header.content, header.content_start)
            }
        }
    }

    fn tagged_from_header(
        &self, header: Header
    ) -> Result<Value, DecodeError> {
        let tag = header.tag;
        if !header.constructed {
            return Ok(Value::Tagged(Tagged {
                class: tag.class(),
                number: tag.number(),
                explicit: false,
                value: Box::new(Value::OctetString(header.content)),
            }))
        }
        let mut items = self.nested(header)?.take_all()?;
        let (explicit, value) = if items.len() == 1 {
            (true, items.pop().unwrap_or(Value::Null))
        }
        else {
            (false, Value::Sequence(items))
        };
        Ok(Value::Tagged(Tagged {
            class: tag.class(),
            number: tag.number(),
            explicit,
            value: Box::new(value)
        }))
    }

    fn take_all(mut self) -> Result<Vec<Value>, DecodeError> {
        let mut res = Vec::new();
        while !self.is_empty() {
            res.push(self.take_value()?);
        }
        Ok(res)
    }

    fn primitive(
        &self, tag: Tag, content: Bytes, pos: usize
    ) -> Result<Value, DecodeError> {
        let strict = self.mode.is_strict();
        match tag {
            Tag::BOOLEAN => {
                if content.len() != 1 {
                    return Err(DecodeError::malformed(
                        "invalid boolean length", pos
                    ))
                }
                match content[0] {
                    0 => Ok(Value::Boolean(false)),
                    0xFF => Ok(Value::Boolean(true)),
                    _ if strict => {
                        Err(DecodeError::malformed("invalid boolean", pos))
                    }
                    _ => Ok(Value::Boolean(true))
                }
            }
            Tag::INTEGER => {
                match Integer::from_content(content, strict) {
                    Some(value) => Ok(Value::Integer(value)),
                    None => {
                        Err(DecodeError::malformed("invalid integer", pos))
                    }
                }
            }
            Tag::BIT_STRING => {
                let unused = match content.first() {
                    Some(unused) => *unused,
                    None => {
                        return Err(DecodeError::malformed(
                            "empty bit string", pos
                        ))
                    }
                };
                let bits = match BitString::new(unused, content.slice(1..)) {
                    Some(bits) => bits,
                    None => {
                        return Err(DecodeError::malformed(
                            "invalid unused bits in bit string", pos
                        ))
                    }
                };
                if strict && !bits.has_clean_padding() {
                    return Err(DecodeError::malformed(
                        "non-zero padding in bit string", pos
                    ))
                }
                Ok(Value::BitString(bits))
            }
            Tag::OCTET_STRING => Ok(Value::OctetString(content)),
            Tag::NULL => {
                if content.is_empty() {
                    Ok(Value::Null)
                }
                else {
                    Err(DecodeError::malformed("non-empty null", pos))
                }
            }
            Tag::OID => {
                match Oid::from_content(content.as_ref()) {
                    Ok(oid) => Ok(Value::Oid(oid)),
                    Err(_) => {
                        Err(DecodeError::malformed(
                            "invalid object identifier", pos
                        ))
                    }
                }
            }
            Tag::UTF8_STRING => {
                match String::from_utf8(content.to_vec()) {
                    Ok(s) => Ok(Value::Utf8String(s)),
                    Err(_) => {
                        Err(DecodeError::malformed("invalid UTF-8", pos))
                    }
                }
            }
            Tag::PRINTABLE_STRING => {
                let valid = if strict {
                    content.iter().all(|&ch| is_printable(ch))
                }
                else {
                    content.is_ascii()
                };
                if !valid {
                    return Err(DecodeError::malformed(
                        "invalid character in PrintableString", pos
                    ))
                }
                Ok(Value::PrintableString(ascii_string(&content)))
            }
            Tag::IA5_STRING => {
                if !content.is_ascii() {
                    return Err(DecodeError::malformed(
                        "invalid character in IA5String", pos
                    ))
                }
                Ok(Value::Ia5String(ascii_string(&content)))
            }
            Tag::UTC_TIME => {
                match parse_utc_time(&content, strict) {
                    Some(time) => Ok(Value::UtcTime(time)),
                    None => {
                        Err(DecodeError::malformed("invalid UTCTime", pos))
                    }
                }
            }
            Tag::GENERALIZED_TIME => {
                match parse_generalized_time(&content, strict) {
                    Some(time) => Ok(Value::GeneralizedTime(time)),
                    None => {
                        Err(DecodeError::malformed(
                            "invalid GeneralizedTime", pos
                        ))
                    }
                }
            }
            tag => {
                Err(DecodeError::new(DecodeErrorKind::InvalidTag(tag), pos))
            }
        }
    }
}


//------------ Helper Functions ----------------------------------------------

/// Returns whether `ch` is in the PrintableString repertoire.
pub fn is_printable(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&ch)
}

fn ascii_string(content: &[u8]) -> String {
    content.iter().map(|&ch| char::from(ch)).collect()
}

fn digits(data: &[u8]) -> Option<u32> {
    if data.is_empty() || !data.iter().all(u8::is_ascii_digit) {
        return None
    }
    Some(data.iter().fold(0, |res, ch| res * 10 + u32::from(ch - b'0')))
}

/// Parses the content of a UTCTime.
///
/// The format is `YYMMDDHHMMSSZ`. Years below 50 are in the 21st century.
/// Lenient parsing also accepts a missing seconds field.
fn parse_utc_time(data: &[u8], strict: bool) -> Option<Time> {
    let (date, seconds) = match data.len() {
        13 => (&data[..10], digits(&data[10..12])?),
        11 if !strict => (&data[..10], 0),
        _ => return None
    };
    if data.last() != Some(&b'Z') {
        return None
    }
    let year = digits(&date[0..2])?;
    let year = if year >= 50 { 1900 + year } else { 2000 + year };
    make_time(
        year, digits(&date[2..4])?, digits(&date[4..6])?,
        digits(&date[6..8])?, digits(&date[8..10])?, seconds, 0
    )
}

/// Parses the content of a GeneralizedTime.
///
/// The format is `YYYYMMDDHHMMSS[.f*]Z` with up to nine fraction digits.
/// In strict mode the fraction must not end in a zero.
fn parse_generalized_time(data: &[u8], strict: bool) -> Option<Time> {
    if data.len() < 15 || data.last() != Some(&b'Z') {
        return None
    }
    let nanos = match data.len() {
        15 => 0,
        _ => {
            if data[14] != b'.' {
                return None
            }
            let fraction = &data[15..data.len() - 1];
            if fraction.is_empty() || fraction.len() > 9 {
                return None
            }
            if strict && fraction.last() == Some(&b'0') {
                return None
            }
            let value = digits(fraction)?;
            value * 10u32.pow(9 - fraction.len() as u32)
        }
    };
    make_time(
        digits(&data[0..4])?, digits(&data[4..6])?, digits(&data[6..8])?,
        digits(&data[8..10])?, digits(&data[10..12])?,
        digits(&data[12..14])?, nanos
    )
}

fn make_time(
    year: u32, month: u32, day: u32,
    hour: u32, minute: u32, second: u32, nanos: u32,
) -> Option<Time> {
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
    let time = date.and_hms_nano_opt(hour, minute, second, nanos)?;
    Some(Time::new(time.and_utc()))
}


//------------ DecodeError ---------------------------------------------------

/// Decoding data has failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    pos: usize,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, pos: usize) -> Self {
        DecodeError { kind, pos }
    }

    pub(crate) fn malformed(msg: &'static str, pos: usize) -> Self {
        DecodeError::new(DecodeErrorKind::Malformed(msg), pos)
    }

    /// Returns what went wrong.
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Returns the offset of the offending octet in the input.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Returns whether the error is due to a value of an unexpected type.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self.kind,
            DecodeErrorKind::TypeMismatch { .. }
            | DecodeErrorKind::InvalidTag(_)
        )
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.pos)
    }
}

impl error::Error for DecodeError { }


//------------ DecodeErrorKind -----------------------------------------------

/// The reason decoding has failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeErrorKind {
    /// The data ended before the value did.
    Truncated,

    /// The indefinite length form was used.
    IndefiniteLength,

    /// A length does not fit into the available integer types.
    LengthOverflow,

    /// A length was not encoded in the shortest form.
    NonMinimalLength,

    /// A universal tag not supported by the decoder.
    InvalidTag(Tag),

    /// A value of a different type was expected.
    TypeMismatch { expected: Tag, found: Tag },

    /// The content of a value was not correctly encoded.
    Malformed(&'static str),

    /// There was data left after the value.
    TrailingData,

    /// Constructed values were nested too deeply.
    TooDeep,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeErrorKind::Truncated => f.write_str("unexpected end of data"),
            DecodeErrorKind::IndefiniteLength => {
                f.write_str("indefinite length not allowed")
            }
            DecodeErrorKind::LengthOverflow => f.write_str("length too large"),
            DecodeErrorKind::NonMinimalLength => {
                f.write_str("non-minimal length")
            }
            DecodeErrorKind::InvalidTag(tag) => {
                write!(f, "unsupported tag {}", tag)
            }
            DecodeErrorKind::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            DecodeErrorKind::Malformed(msg) => f.write_str(msg),
            DecodeErrorKind::TrailingData => f.write_str("trailing data"),
            DecodeErrorKind::TooDeep => f.write_str("nesting too deep"),
        }
    }
}


//------------ Tests ---------------------------------------------------------
