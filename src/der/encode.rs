//! Encoding a value tree as DER.

use std::{error, fmt};
use bytes::Bytes;
use chrono::{Datelike, Timelike};
use crate::x509::Time;
use super::decode::is_printable;
use super::tag::{Class, Tag};
use super::value::Value;


//------------ Encode --------------------------------------------------------

/// A type that can be converted into a value tree.
pub trait Encode {
    /// Returns the value representing `self`.
    ///
    /// The encoder is passed along so that types can consult its options.
    fn to_value(&self, encoder: &Encoder) -> Result<Value, EncodeError>;

    /// Encodes `self` using the given encoder.
    fn encode(&self, encoder: &Encoder) -> Result<Bytes, EncodeError> {
        encoder.encode(&self.to_value(encoder)?)
    }
}

impl Encode for Value {
    fn to_value(&self, _: &Encoder) -> Result<Value, EncodeError> {
        Ok(self.clone())
    }
}


//------------ Encoder -------------------------------------------------------

/// Turns values into DER encoded octets.
///
/// Lengths are always definite and minimal. The elements of sequences and
/// sets are written in the order they appear in the value. Sets are not
/// sorted.
#[derive(Clone, Copy, Debug, Default)]
pub struct Encoder {
    force_printable_strings: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether UTF8String values should be downgraded.
    ///
    /// If enabled, UTF8String values that only contain characters from the
    /// PrintableString repertoire are encoded as PrintableString, other
    /// ASCII text is encoded as IA5String, and anything else can’t be
    /// encoded at all. Some older software doesn’t understand UTF8String.
    pub fn force_printable_strings(mut self, force: bool) -> Self {
        self.force_printable_strings = force;
        self
    }

    pub fn forces_printable_strings(&self) -> bool {
        self.force_printable_strings
    }

    /// Encodes a value.
    pub fn encode(&self, value: &Value) -> Result<Bytes, EncodeError> {
        let mut target = Vec::new();
        self.encode_to(value, &mut target)?;
        Ok(target.into())
    }

    /// Appends the encoding of a value to `target`.
    pub fn encode_to(
        &self, value: &Value, target: &mut Vec<u8>
    ) -> Result<(), EncodeError> {
        let (tag, constructed, content) = self.encode_parts(value)?;
        write_tlv(tag, constructed, &content, target);
        Ok(())
    }

    /// Produces the tag, constructed flag, and content octets of a value.
    fn encode_parts(
        &self, value: &Value
    ) -> Result<(Tag, bool, Vec<u8>), EncodeError> {
        let mut content = Vec::new();
        let (tag, constructed) = match *value {
            Value::Boolean(value) => {
                content.push(if value { 0xFF } else { 0 });
                (Tag::BOOLEAN, false)
            }
            Value::Integer(ref value) => {
                content.extend_from_slice(value.as_slice());
                (Tag::INTEGER, false)
            }
            Value::BitString(ref value) => {
                content.push(value.unused());
                content.extend_from_slice(value.octet_slice());
                (Tag::BIT_STRING, false)
            }
            Value::OctetString(ref value) => {
                content.extend_from_slice(value.as_ref());
                (Tag::OCTET_STRING, false)
            }
            Value::Null => (Tag::NULL, false),
            Value::Oid(ref value) => {
                value.write_content(&mut content)?;
                (Tag::OID, false)
            }
            Value::Utf8String(ref value) => {
                content.extend_from_slice(value.as_bytes());
                if !self.force_printable_strings {
                    (Tag::UTF8_STRING, false)
                }
                else if value.bytes().all(is_printable) {
                    (Tag::PRINTABLE_STRING, false)
                }
                else if value.is_ascii() {
                    (Tag::IA5_STRING, false)
                }
                else {
                    return Err(EncodeError::new(
                        "string not representable as PrintableString \
                         or IA5String"
                    ))
                }
            }
            Value::PrintableString(ref value) => {
                if !value.bytes().all(is_printable) {
                    return Err(EncodeError::new(
                        "invalid character in PrintableString"
                    ))
                }
                content.extend_from_slice(value.as_bytes());
                (Tag::PRINTABLE_STRING, false)
            }
            Value::Ia5String(ref value) => {
                if !value.is_ascii() {
                    return Err(EncodeError::new(
                        "invalid character in IA5String"
                    ))
                }
                content.extend_from_slice(value.as_bytes());
                (Tag::IA5_STRING, false)
            }
            Value::UtcTime(time) => {
                write_utc_time(time, &mut content)?;
                (Tag::UTC_TIME, false)
            }
            Value::GeneralizedTime(time) => {
                write_generalized_time(time, &mut content)?;
                (Tag::GENERALIZED_TIME, false)
            }
            Value::Sequence(ref items) => {
                for item in items {
                    self.encode_to(item, &mut content)?;
                }
                (Tag::SEQUENCE, true)
            }
            Value::Set(ref items) => {
                for item in items {
                    self.encode_to(item, &mut content)?;
                }
                (Tag::SET, true)
            }
            Value::Tagged(ref tagged) => {
                if tagged.class == Class::Universal {
                    return Err(EncodeError::new(
                        "tagged value with universal class"
                    ))
                }
                if tagged.explicit {
                    self.encode_to(&tagged.value, &mut content)?;
                    (tagged.tag(), true)
                }
                else {
                    let (_, constructed, inner) = self.encode_parts(
                        &tagged.value
                    )?;
                    content = inner;
                    (tagged.tag(), constructed)
                }
            }
        };
        Ok((tag, constructed, content))
    }
}


//------------ Helper Functions ----------------------------------------------

/// Appends a complete value with the given content to `target`.
fn write_tlv(tag: Tag, constructed: bool, content: &[u8], target: &mut Vec<u8>) {
    tag.write_encoded(constructed, target);
    write_length(content.len(), target);
    target.extend_from_slice(content);
}

/// Appends length octets in the shortest form to `target`.
pub fn write_length(len: usize, target: &mut Vec<u8>) {
    if len < 0x80 {
        target.push(len as u8);
        return
    }
    let octets = (len as u64).to_be_bytes();
    let start = octets.iter().position(|&ch| ch != 0).unwrap_or(7);
    target.push(0x80 | (octets.len() - start) as u8);
    target.extend_from_slice(&octets[start..]);
}

fn write_utc_time(time: Time, target: &mut Vec<u8>) -> Result<(), EncodeError> {
    let year = time.year();
    if !(1950..=2049).contains(&year) {
        return Err(EncodeError::new("year out of range for UTCTime"))
    }
    if time.nanosecond() != 0 {
        return Err(EncodeError::new("fractional seconds in UTCTime"))
    }
    target.extend_from_slice(
        format!(
            "{:02}{:02}{:02}{:02}{:02}{:02}Z",
            year % 100, time.month(), time.day(),
            time.hour(), time.minute(), time.second()
        ).as_bytes()
    );
    Ok(())
}

fn write_generalized_time(
    time: Time, target: &mut Vec<u8>
) -> Result<(), EncodeError> {
    let year = time.year();
    if !(0..=9999).contains(&year) {
        return Err(EncodeError::new("year out of range for GeneralizedTime"))
    }
    target.extend_from_slice(
        format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            year, time.month(), time.day(),
            time.hour(), time.minute(), time.second()
        ).as_bytes()
    );
    let nanos = time.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{:09}", nanos);
        target.push(b'.');
        target.extend_from_slice(fraction.trim_end_matches('0').as_bytes());
    }
    target.push(b'Z');
    Ok(())
}


//------------ EncodeError ---------------------------------------------------

/// A value cannot be encoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncodeError(&'static str);

impl EncodeError {
    pub(crate) fn new(msg: &'static str) -> Self {
        EncodeError(msg)
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl error::Error for EncodeError { }


//------------ Tests ---------------------------------------------------------
