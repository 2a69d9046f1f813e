//! The value tree.

use bytes::Bytes;
use crate::oid::Oid;
use crate::x509::Time;
use super::bitstring::BitString;
use super::int::Integer;
use super::tag::{Class, Tag};


//------------ Value ---------------------------------------------------------

/// A decoded DER value.
///
/// This is the closed set of types the codec understands. Anything else
/// found in the universal class is rejected by the decoder. Values with a
/// tag of any other class are represented by [`Tagged`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(Integer),
    BitString(BitString),
    OctetString(Bytes),
    Null,
    Oid(Oid),
    Utf8String(String),
    PrintableString(String),
    Ia5String(String),

    /// A UTCTime with second precision.
    UtcTime(Time),

    /// A GeneralizedTime, possibly with fractional seconds.
    GeneralizedTime(Time),

    Sequence(Vec<Value>),
    Set(Vec<Value>),
    Tagged(Tagged),
}

impl Value {
    /// Returns the tag this value is encoded with.
    pub fn tag(&self) -> Tag {
        match *self {
            Value::Boolean(_) => Tag::BOOLEAN,
            Value::Integer(_) => Tag::INTEGER,
            Value::BitString(_) => Tag::BIT_STRING,
            Value::OctetString(_) => Tag::OCTET_STRING,
            Value::Null => Tag::NULL,
            Value::Oid(_) => Tag::OID,
            Value::Utf8String(_) => Tag::UTF8_STRING,
            Value::PrintableString(_) => Tag::PRINTABLE_STRING,
            Value::Ia5String(_) => Tag::IA5_STRING,
            Value::UtcTime(_) => Tag::UTC_TIME,
            Value::GeneralizedTime(_) => Tag::GENERALIZED_TIME,
            Value::Sequence(_) => Tag::SEQUENCE,
            Value::Set(_) => Tag::SET,
            Value::Tagged(ref tagged) => tagged.tag(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(value) => Some(value),
            _ => None
        }
    }

    pub fn as_integer(&self) -> Option<&Integer> {
        match *self {
            Value::Integer(ref value) => Some(value),
            _ => None
        }
    }

    pub fn as_bit_string(&self) -> Option<&BitString> {
        match *self {
            Value::BitString(ref value) => Some(value),
            _ => None
        }
    }

    pub fn as_octet_string(&self) -> Option<&Bytes> {
        match *self {
            Value::OctetString(ref value) => Some(value),
            _ => None
        }
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match *self {
            Value::Oid(ref value) => Some(value),
            _ => None
        }
    }

    /// Returns the text of any of the string types.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Utf8String(ref value)
            | Value::PrintableString(ref value)
            | Value::Ia5String(ref value) => Some(value.as_str()),
            _ => None
        }
    }

    /// Returns the time of either of the time types.
    pub fn as_time(&self) -> Option<Time> {
        match *self {
            Value::UtcTime(value) | Value::GeneralizedTime(value) => {
                Some(value)
            }
            _ => None
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match *self {
            Value::Sequence(ref value) => Some(value.as_slice()),
            _ => None
        }
    }

    pub fn as_set(&self) -> Option<&[Value]> {
        match *self {
            Value::Set(ref value) => Some(value.as_slice()),
            _ => None
        }
    }

    pub fn as_tagged(&self) -> Option<&Tagged> {
        match *self {
            Value::Tagged(ref value) => Some(value),
            _ => None
        }
    }

    /// Returns the inner value if this is a context tagged value.
    pub fn as_context(&self, number: u32) -> Option<&Tagged> {
        self.as_tagged().filter(|tagged| {
            tagged.class == Class::Context && tagged.number == number
        })
    }
}


//--- From

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Integer> for Value {
    fn from(value: Integer) -> Self {
        Value::Integer(value)
    }
}

impl From<BitString> for Value {
    fn from(value: BitString) -> Self {
        Value::BitString(value)
    }
}

impl From<Oid> for Value {
    fn from(value: Oid) -> Self {
        Value::Oid(value)
    }
}

impl From<Tagged> for Value {
    fn from(value: Tagged) -> Self {
        Value::Tagged(value)
    }
}


//------------ Tagged --------------------------------------------------------

/// A value with a tag of the application, context, or private class.
///
/// If `explicit` is `true`, the inner value is encoded in full as the
/// content of a constructed value with this tag. Otherwise, the tag
/// replaces the tag of the inner value.
///
/// Since the decoder has no schema, it can’t know which type an implicitly
/// tagged value has. It produces a primitive value as an implicitly tagged
/// [`Value::OctetString`] of the content, a constructed value with exactly
/// one element as an explicitly tagged value, and any other constructed
/// value as an implicitly tagged [`Value::Sequence`]. Encoding each of
/// these reproduces the original octets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tagged {
    pub class: Class,
    pub number: u32,
    pub explicit: bool,
    pub value: Box<Value>,
}

impl Tagged {
    /// Creates an explicitly tagged value in the context class.
    pub fn explicit(number: u32, value: Value) -> Self {
        Tagged {
            class: Class::Context,
            number,
            explicit: true,
            value: Box::new(value)
        }
    }

    /// Creates an implicitly tagged value in the context class.
    pub fn implicit(number: u32, value: Value) -> Self {
        Tagged {
            class: Class::Context,
            number,
            explicit: false,
            value: Box::new(value)
        }
    }

    pub fn tag(&self) -> Tag {
        Tag::new(self.class, self.number)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the content of a primitive implicitly tagged value.
    pub fn as_primitive(&self) -> Option<&Bytes> {
        if self.explicit {
            None
        }
        else {
            self.value.as_octet_string()
        }
    }

    /// Returns the elements of the tagged value.
    ///
    /// This is the single inner value of an explicitly tagged value or
    /// the elements of an implicitly tagged sequence.
    pub fn elements(&self) -> &[Value] {
        if self.explicit {
            std::slice::from_ref(self.value.as_ref())
        }
        else {
            match *self.value {
                Value::Sequence(ref items) | Value::Set(ref items) => {
                    items.as_slice()
                }
                ref other => std::slice::from_ref(other)
            }
        }
    }
}
