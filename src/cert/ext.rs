//! X.509 extensions.

use std::{fmt, ops};
use std::collections::{BTreeMap, BTreeSet};
use bytes::Bytes;
use log::warn;
use crate::oid;
use crate::der::{
    BitString, Class, Encode, EncodeError, Encoder, Integer, Tagged, Value,
};
use crate::error::Error;
use crate::oid::Oid;


//------------ Extensions ----------------------------------------------------

/// The extensions of a certificate or certificate request.
///
/// Extensions are kept in the order they were encountered or added. There
/// is at most one extension for each object identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Extensions {
    items: Vec<Extension>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the extensions from the value of the extensions field.
    ///
    /// ```text
    /// Extensions  ::=  SEQUENCE SIZE (1..MAX) OF Extension
    ///
    /// Extension  ::=  SEQUENCE  {
    ///      extnID      OBJECT IDENTIFIER,
    ///      critical    BOOLEAN DEFAULT FALSE,
    ///      extnValue   OCTET STRING }
    /// ```
    ///
    /// The content of each extension value is decoded, too. If that fails
    /// for a non-critical extension, the raw content is kept as an octet
    /// string. For a critical extension, it is an error. The well-known
    /// extensions are checked for the correct shape.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let items = match value.as_sequence() {
            Some(items) => items,
            None => {
                return Err(Error::MalformedCertificate("invalid extensions"))
            }
        };
        let mut res = Extensions::new();
        for item in items {
            let ext = Extension::from_value(item)?;
            if res.get(&ext.oid).is_some() {
                return Err(Error::MalformedCertificate(
                    "duplicate extension"
                ))
            }
            res.items.push(ext);
        }
        res.check_known()?;
        Ok(res)
    }

    fn check_known(&self) -> Result<(), Error> {
        if let Some(ext) = self.get(&oid::CE_KEY_USAGE) {
            KeyUsage::from_value(&ext.value)?;
        }
        if let Some(ext) = self.get(&oid::CE_BASIC_CONSTRAINTS) {
            BasicConstraints::from_value(&ext.value)?;
        }
        if let Some(ext) = self.get(&oid::CE_EXTENDED_KEY_USAGE) {
            extended_key_usage_from_value(&ext.value)?;
        }
        if let Some(ext) = self.get(&oid::CE_SUBJECT_ALT_NAME) {
            general_names_from_value(&ext.value)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.items.iter()
    }

    /// Returns the object identifiers of all extensions in order.
    pub fn oids(&self) -> impl Iterator<Item = &Oid> {
        self.items.iter().map(|item| &item.oid)
    }

    pub fn get<T: AsRef<[u64]>>(&self, oid: &Oid<T>) -> Option<&Extension> {
        self.items.iter().find(|item| item.oid == *oid)
    }

    /// Adds an extension.
    ///
    /// An existing extension with the same identifier is replaced in place.
    pub fn insert(&mut self, ext: Extension) {
        match self.items.iter_mut().find(|item| item.oid == ext.oid) {
            Some(item) => *item = ext,
            None => self.items.push(ext)
        }
    }

    /// Removes the extension with the given identifier.
    pub fn remove<T: AsRef<[u64]>>(
        &mut self, oid: &Oid<T>
    ) -> Option<Extension> {
        let pos = self.items.iter().position(|item| item.oid == *oid)?;
        Some(self.items.remove(pos))
    }
}


/// # Well-known Extensions
///
/// The values of well-known extensions have been checked during parsing,
/// so these never fail for parsed extensions. Extensions added by hand
/// that can’t be interpreted are treated as if they were absent.
impl Extensions {
    /// Returns the key usage and whether the extension is critical.
    pub fn key_usage(&self) -> Option<(KeyUsage, bool)> {
        let ext = self.get(&oid::CE_KEY_USAGE)?;
        KeyUsage::from_value(&ext.value).ok().map(|ku| (ku, ext.critical))
    }

    pub fn basic_constraints(&self) -> Option<BasicConstraints> {
        let ext = self.get(&oid::CE_BASIC_CONSTRAINTS)?;
        BasicConstraints::from_value(&ext.value).ok()
    }

    /// Returns the extended key usage and whether it is critical.
    pub fn extended_key_usage(&self) -> Option<(BTreeSet<Oid>, bool)> {
        let ext = self.get(&oid::CE_EXTENDED_KEY_USAGE)?;
        extended_key_usage_from_value(&ext.value).ok().map(|eku| {
            (eku, ext.critical)
        })
    }

    /// Returns all subject alternative names in order.
    pub fn subject_alternative_names(&self) -> Vec<GeneralName> {
        self.get(&oid::CE_SUBJECT_ALT_NAME).and_then(|ext| {
            general_names_from_value(&ext.value).ok()
        }).unwrap_or_default()
    }
}


//--- Encode

impl Encode for Extensions {
    fn to_value(&self, encoder: &Encoder) -> Result<Value, EncodeError> {
        self.items.iter().map(|item| {
            item.to_value(encoder)
        }).collect::<Result<_, _>>().map(Value::Sequence)
    }
}


//------------ Extension -----------------------------------------------------

/// A single extension.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Extension {
    oid: Oid,
    critical: bool,
    value: Value,

    /// The content of the extension value as it was parsed.
    raw: Option<Bytes>,
}

impl Extension {
    pub fn new(oid: impl Into<Oid>, critical: bool, value: Value) -> Self {
        Extension { oid: oid.into(), critical, value, raw: None }
    }

    fn from_value(value: &Value) -> Result<Self, Error> {
        let (oid, critical, raw) = match value.as_sequence() {
            Some([Value::Oid(oid), Value::OctetString(raw)]) => {
                (oid, false, raw)
            }
            Some([
                Value::Oid(oid), Value::Boolean(critical),
                Value::OctetString(raw)
            ]) => {
                (oid, *critical, raw)
            }
            _ => {
                return Err(Error::MalformedCertificate("invalid extension"))
            }
        };
        let value = match crate::der::decode(raw.clone()) {
            Ok(value) => value,
            Err(err) => {
                if critical {
                    return Err(Error::MalformedCertificate(
                        "undecodable critical extension"
                    ))
                }
                warn!(
                    "keeping undecodable extension {} as raw octets: {}",
                    oid, err
                );
                Value::OctetString(raw.clone())
            }
        };
        Ok(Extension {
            oid: oid.clone(), critical, value, raw: Some(raw.clone())
        })
    }

    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the content of the extension value if it was parsed.
    pub fn raw(&self) -> Option<&Bytes> {
        self.raw.as_ref()
    }
}

impl Encode for Extension {
    fn to_value(&self, encoder: &Encoder) -> Result<Value, EncodeError> {
        let content = match self.raw {
            Some(ref raw) => raw.clone(),
            None => encoder.encode(&self.value)?,
        };
        let mut res = vec![Value::Oid(self.oid.clone())];
        if self.critical {
            res.push(Value::Boolean(true));
        }
        res.push(Value::OctetString(content));
        Ok(Value::Sequence(res))
    }
}


//------------ KeyUsage ------------------------------------------------------

/// The flags of the key usage extension.
///
/// The first octet of the bit string is used as is, so that
/// `digitalSignature`, the first bit, is `0x80` and `encipherOnly`, the
/// eighth, is `0x01`. The ninth bit, `decipherOnly`, is `0x100`.
///
/// ```text
/// KeyUsage ::= BIT STRING {
///      digitalSignature        (0),
///      nonRepudiation          (1),
///      keyEncipherment         (2),
///      dataEncipherment        (3),
///      keyAgreement            (4),
///      keyCertSign             (5),
///      cRLSign                 (6),
///      encipherOnly            (7),
///      decipherOnly            (8) }
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyUsage(u16);

impl KeyUsage {
    pub const NONE: Self = KeyUsage(0);
    pub const DIGITAL_SIGNATURE: Self = KeyUsage(0x80);
    pub const NON_REPUDIATION: Self = KeyUsage(0x40);
    pub const KEY_ENCIPHERMENT: Self = KeyUsage(0x20);
    pub const DATA_ENCIPHERMENT: Self = KeyUsage(0x10);
    pub const KEY_AGREEMENT: Self = KeyUsage(0x08);
    pub const KEY_CERT_SIGN: Self = KeyUsage(0x04);
    pub const CRL_SIGN: Self = KeyUsage(0x02);
    pub const ENCIPHER_ONLY: Self = KeyUsage(0x01);
    pub const DECIPHER_ONLY: Self = KeyUsage(0x100);

    /// The key usage of a certificate without the extension.
    ///
    /// This means that there are no restrictions, not that there are no
    /// allowed usages.
    pub const UNSPECIFIED: Self = KeyUsage(0xFFFF);

    pub fn from_bits(bits: u16) -> Self {
        KeyUsage(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_unspecified(self) -> bool {
        self == KeyUsage::UNSPECIFIED
    }

    /// Returns whether all flags in `other` are also set in `self`.
    pub fn contains(self, other: KeyUsage) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn from_bit_string(bits: &BitString) -> Self {
        let octets = bits.octet_slice();
        let mut res = u16::from(octets.first().copied().unwrap_or(0));
        if octets.get(1).map(|octet| octet & 0x80 != 0).unwrap_or(false) {
            res |= 0x100
        }
        KeyUsage(res)
    }

    pub fn from_value(value: &Value) -> Result<Self, Error> {
        match value.as_bit_string() {
            Some(bits) => Ok(Self::from_bit_string(bits)),
            None => Err(Error::MalformedCertificate("invalid key usage"))
        }
    }

    /// Returns the bit string for the flags.
    ///
    /// Trailing zero bits are dropped as DER requires for named bit lists.
    pub fn to_bit_string(self) -> BitString {
        let first = (self.0 & 0xFF) as u8;
        let (octets, unused) = if self.0 & 0x100 != 0 {
            (vec![first, 0x80], 7)
        }
        else if first == 0 {
            (Vec::new(), 0)
        }
        else {
            (vec![first], first.trailing_zeros() as u8)
        };
        BitString::new(unused, octets.into()).unwrap_or_else(|| {
            BitString::from_octets(Bytes::new())
        })
    }
}

impl Encode for KeyUsage {
    fn to_value(&self, _: &Encoder) -> Result<Value, EncodeError> {
        if self.is_unspecified() {
            return Err(EncodeError::new("unspecified key usage"))
        }
        Ok(Value::BitString(self.to_bit_string()))
    }
}

impl ops::BitOr for KeyUsage {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        KeyUsage(self.0 | other.0)
    }
}

impl ops::BitAnd for KeyUsage {
    type Output = Self;

    fn bitand(self, other: Self) -> Self {
        KeyUsage(self.0 & other.0)
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_unspecified() {
            return f.write_str("unspecified")
        }
        let names = [
            (KeyUsage::DIGITAL_SIGNATURE, "digitalSignature"),
            (KeyUsage::NON_REPUDIATION, "nonRepudiation"),
            (KeyUsage::KEY_ENCIPHERMENT, "keyEncipherment"),
            (KeyUsage::DATA_ENCIPHERMENT, "dataEncipherment"),
            (KeyUsage::KEY_AGREEMENT, "keyAgreement"),
            (KeyUsage::KEY_CERT_SIGN, "keyCertSign"),
            (KeyUsage::CRL_SIGN, "cRLSign"),
            (KeyUsage::ENCIPHER_ONLY, "encipherOnly"),
            (KeyUsage::DECIPHER_ONLY, "decipherOnly"),
        ];
        let mut first = true;
        for (flag, name) in names.iter() {
            if self.contains(*flag) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}


//------------ BasicConstraints ----------------------------------------------

/// The content of the basic constraints extension.
///
/// ```text
/// BasicConstraints ::= SEQUENCE {
///      cA                      BOOLEAN DEFAULT FALSE,
///      pathLenConstraint       INTEGER (0..MAX) OPTIONAL }
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u64>,
}

impl BasicConstraints {
    pub fn new(ca: bool, path_len: Option<u64>) -> Self {
        BasicConstraints { ca, path_len }
    }

    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let path_len = |value: &Integer| {
            value.to_u64().ok_or(Error::MalformedCertificate(
                "invalid path length constraint"
            ))
        };
        match value.as_sequence() {
            Some([]) => Ok(BasicConstraints::new(false, None)),
            Some([Value::Boolean(ca)]) => {
                Ok(BasicConstraints::new(*ca, None))
            }
            Some([Value::Integer(len)]) => {
                Ok(BasicConstraints::new(false, Some(path_len(len)?)))
            }
            Some([Value::Boolean(ca), Value::Integer(len)]) => {
                Ok(BasicConstraints::new(*ca, Some(path_len(len)?)))
            }
            _ => {
                Err(Error::MalformedCertificate(
                    "invalid basic constraints"
                ))
            }
        }
    }
}

impl Encode for BasicConstraints {
    fn to_value(&self, _: &Encoder) -> Result<Value, EncodeError> {
        let mut res = Vec::new();
        if self.ca {
            res.push(Value::Boolean(true))
        }
        if let Some(len) = self.path_len {
            res.push(Value::Integer(len.into()))
        }
        Ok(Value::Sequence(res))
    }
}


//------------ Extended Key Usage --------------------------------------------

/// Parses the extended key usage extension into a set of purposes.
///
/// ```text
/// ExtKeyUsageSyntax ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId
/// KeyPurposeId ::= OBJECT IDENTIFIER
/// ```
pub fn extended_key_usage_from_value(
    value: &Value
) -> Result<BTreeSet<Oid>, Error> {
    let items = match value.as_sequence() {
        Some(items) => items,
        None => {
            return Err(Error::MalformedCertificate(
                "invalid extended key usage"
            ))
        }
    };
    items.iter().map(|item| {
        item.as_oid().cloned().ok_or(Error::MalformedCertificate(
            "invalid extended key usage"
        ))
    }).collect()
}


//------------ GeneralName ---------------------------------------------------

/// A single entry of a general names sequence.
///
/// ```text
/// GeneralName ::= CHOICE {
///      otherName                       [0]     OtherName,
///      rfc822Name                      [1]     IA5String,
///      dNSName                         [2]     IA5String,
///      x400Address                     [3]     ORAddress,
///      directoryName                   [4]     Name,
///      ediPartyName                    [5]     EDIPartyName,
///      uniformResourceIdentifier       [6]     IA5String,
///      iPAddress                       [7]     OCTET STRING,
///      registeredID                    [8]     OBJECT IDENTIFIER }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GeneralName {
    Rfc822(String),
    Dns(String),
    Uri(String),
    IpAddress(Bytes),

    /// Any other choice, kept as the tagged value.
    Other(Tagged),
}

const RFC822_NAME: u32 = 1;
const DNS_NAME: u32 = 2;
const URI: u32 = 6;
const IP_ADDRESS: u32 = 7;

impl GeneralName {
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let tagged = match value.as_tagged() {
            Some(tagged) if tagged.class == Class::Context => tagged,
            _ => {
                return Err(Error::MalformedCertificate(
                    "invalid general name"
                ))
            }
        };
        let text = || -> Result<String, Error> {
            match tagged.as_primitive() {
                Some(content) if content.is_ascii() => {
                    Ok(content.iter().map(|&ch| char::from(ch)).collect())
                }
                _ => {
                    Err(Error::MalformedCertificate("invalid general name"))
                }
            }
        };
        match tagged.number {
            RFC822_NAME => text().map(GeneralName::Rfc822),
            DNS_NAME => text().map(GeneralName::Dns),
            URI => text().map(GeneralName::Uri),
            IP_ADDRESS => {
                match tagged.as_primitive() {
                    Some(content) => Ok(GeneralName::IpAddress(content.clone())),
                    None => {
                        Err(Error::MalformedCertificate(
                            "invalid general name"
                        ))
                    }
                }
            }
            _ => Ok(GeneralName::Other(tagged.clone()))
        }
    }

    /// Returns the type of this name.
    pub fn name_type(&self) -> GeneralNameType {
        match *self {
            GeneralName::Rfc822(_) => GeneralNameType::Rfc822,
            GeneralName::Dns(_) => GeneralNameType::Dns,
            GeneralName::Uri(_) => GeneralNameType::Uri,
            GeneralName::IpAddress(_) => GeneralNameType::Other(IP_ADDRESS),
            GeneralName::Other(ref tagged) => {
                GeneralNameType::Other(tagged.number)
            }
        }
    }

    /// Returns the value of this name as it appears in the name map.
    pub fn to_san_value(&self) -> SanValue {
        match *self {
            GeneralName::Rfc822(ref s)
            | GeneralName::Dns(ref s)
            | GeneralName::Uri(ref s) => SanValue::Text(s.clone()),
            GeneralName::IpAddress(ref addr) => {
                SanValue::Value(Value::Tagged(Tagged::implicit(
                    IP_ADDRESS, Value::OctetString(addr.clone())
                )))
            }
            GeneralName::Other(ref tagged) => {
                SanValue::Value(Value::Tagged(tagged.clone()))
            }
        }
    }
}

impl Encode for GeneralName {
    fn to_value(&self, _: &Encoder) -> Result<Value, EncodeError> {
        let (number, content) = match *self {
            GeneralName::Rfc822(ref s) => (RFC822_NAME, s),
            GeneralName::Dns(ref s) => (DNS_NAME, s),
            GeneralName::Uri(ref s) => (URI, s),
            GeneralName::IpAddress(ref addr) => {
                return Ok(Value::Tagged(Tagged::implicit(
                    IP_ADDRESS, Value::OctetString(addr.clone())
                )))
            }
            GeneralName::Other(ref tagged) => {
                return Ok(Value::Tagged(tagged.clone()))
            }
        };
        Ok(Value::Tagged(Tagged::implicit(
            number, Value::Ia5String(content.clone())
        )))
    }
}

/// Parses a general names sequence.
pub fn general_names_from_value(
    value: &Value
) -> Result<Vec<GeneralName>, Error> {
    match value.as_sequence() {
        Some(items) => items.iter().map(GeneralName::from_value).collect(),
        None => Err(Error::MalformedCertificate("invalid general names"))
    }
}

/// Returns the subject alternative name map for a list of names.
///
/// Later entries of the same type replace earlier ones.
pub fn general_names_to_map(
    names: &[GeneralName]
) -> BTreeMap<GeneralNameType, SanValue> {
    names.iter().map(|name| (name.name_type(), name.to_san_value())).collect()
}


//------------ GeneralNameType -----------------------------------------------

/// The type of a general name used as key in the subject alternative name
/// map.
///
/// The three text types have names. All others are represented by their
/// context tag number.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum GeneralNameType {
    Rfc822,
    Dns,
    Uri,
    Other(u32),
}

impl fmt::Display for GeneralNameType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GeneralNameType::Rfc822 => f.write_str("RFC822"),
            GeneralNameType::Dns => f.write_str("DNS"),
            GeneralNameType::Uri => f.write_str("URI"),
            GeneralNameType::Other(number) => write!(f, "{}", number),
        }
    }
}


//------------ SanValue ------------------------------------------------------

/// A value in the subject alternative name map.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SanValue {
    /// The text of a text-like name.
    Text(String),

    /// The value of any other name.
    Value(Value),
}

impl SanValue {
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            SanValue::Text(ref s) => Some(s.as_str()),
            SanValue::Value(_) => None
        }
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::der::decode;

    #[test]
    fn key_usage_bits() {
        let ku = KeyUsage::from_value(
            &decode(&b"\x03\x02\x01\x86"[..]).unwrap()
        ).unwrap();
        assert_eq!(
            ku,
            KeyUsage::DIGITAL_SIGNATURE | KeyUsage::KEY_CERT_SIGN
                | KeyUsage::CRL_SIGN
        );
        assert_eq!(ku.bits(), 0x86);
        assert_eq!(
            Encoder::new().encode(
                &ku.to_value(&Encoder::new()).unwrap()
            ).unwrap().as_ref(),
            b"\x03\x02\x01\x86"
        );

        let ku = KeyUsage::from_value(
            &decode(&b"\x03\x03\x07\x80\x80"[..]).unwrap()
        ).unwrap();
        assert_eq!(ku, KeyUsage::DIGITAL_SIGNATURE | KeyUsage::DECIPHER_ONLY);
        assert_eq!(ku.bits(), 0x180);
        let bits = ku.to_bit_string();
        assert_eq!(bits.unused(), 7);
        assert_eq!(bits.octet_slice(), b"\x80\x80");

        assert_eq!(
            KeyUsage::DIGITAL_SIGNATURE.to_bit_string().unused(), 7
        );
        assert!(KeyUsage::NONE.to_bit_string().octet_slice().is_empty());
        assert!(KeyUsage::UNSPECIFIED.to_value(&Encoder::new()).is_err());
    }

    #[test]
    fn key_usage_contains() {
        let ku = KeyUsage::DIGITAL_SIGNATURE;
        assert!(ku.contains(KeyUsage::DIGITAL_SIGNATURE));
        assert!(
            !ku.contains(KeyUsage::DIGITAL_SIGNATURE | KeyUsage::KEY_ENCIPHERMENT)
        );
        assert!(KeyUsage::UNSPECIFIED.contains(KeyUsage::DECIPHER_ONLY));
        assert_eq!(
            (KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN).to_string(),
            "keyCertSign, cRLSign"
        );
    }

    #[test]
    fn basic_constraints() {
        assert_eq!(
            BasicConstraints::from_value(
                &decode(&b"\x30\x06\x01\x01\xff\x02\x01\x01"[..]).unwrap()
            ).unwrap(),
            BasicConstraints::new(true, Some(1))
        );
        assert_eq!(
            BasicConstraints::from_value(
                &decode(&b"\x30\x00"[..]).unwrap()
            ).unwrap(),
            BasicConstraints::new(false, None)
        );
        assert!(
            BasicConstraints::from_value(
                &decode(&b"\x30\x03\x02\x01\xff"[..]).unwrap()
            ).is_err()
        );
        assert_eq!(
            BasicConstraints::new(false, None).to_value(
                &Encoder::new()
            ).unwrap(),
            Value::Sequence(Vec::new())
        );
    }

    #[test]
    fn general_names() {
        let names = vec![
            GeneralName::Dns("example.com".into()),
            GeneralName::Rfc822("a@example.com".into()),
            GeneralName::IpAddress(Bytes::from_static(b"\xc0\x00\x02\x01")),
            GeneralName::Dns("example.net".into()),
        ];
        let value = Value::Sequence(
            names.iter().map(|name| {
                name.to_value(&Encoder::new()).unwrap()
            }).collect()
        );
        let encoded = Encoder::new().encode(&value).unwrap();
        let decoded = general_names_from_value(&decode(encoded).unwrap())
            .unwrap();
        assert_eq!(decoded, names);

        let map = general_names_to_map(&decoded);
        assert_eq!(map.len(), 3);
        assert_eq!(
            map[&GeneralNameType::Dns].as_str(), Some("example.net")
        );
        assert_eq!(
            map[&GeneralNameType::Rfc822].as_str(), Some("a@example.com")
        );
        assert!(map[&GeneralNameType::Other(7)].as_str().is_none());
        assert_eq!(GeneralNameType::Other(7).to_string(), "7");
        assert_eq!(GeneralNameType::Rfc822.to_string(), "RFC822");
    }

    #[test]
    fn extensions_table() {
        let mut exts = Extensions::new();
        exts.insert(Extension::new(
            oid::CE_KEY_USAGE, true,
            KeyUsage::DIGITAL_SIGNATURE.to_value(&Encoder::new()).unwrap()
        ));
        exts.insert(Extension::new(
            oid::CE_BASIC_CONSTRAINTS, true,
            BasicConstraints::new(true, None).to_value(
                &Encoder::new()
            ).unwrap()
        ));
        exts.insert(Extension::new(
            oid::CE_KEY_USAGE, false,
            KeyUsage::KEY_CERT_SIGN.to_value(&Encoder::new()).unwrap()
        ));
        assert_eq!(exts.len(), 2);
        assert_eq!(
            exts.oids().cloned().collect::<Vec<_>>(),
            vec![
                oid::CE_KEY_USAGE.to_oid(), oid::CE_BASIC_CONSTRAINTS.to_oid()
            ]
        );
        assert_eq!(exts.key_usage(), Some((KeyUsage::KEY_CERT_SIGN, false)));

        let value = exts.to_value(&Encoder::new()).unwrap();
        let encoded = Encoder::new().encode(&value).unwrap();
        let mut parsed = Extensions::from_value(
            &decode(encoded).unwrap()
        ).unwrap();
        assert_eq!(parsed.key_usage(), exts.key_usage());
        assert_eq!(parsed.basic_constraints(), exts.basic_constraints());
        assert!(parsed.remove(&oid::CE_KEY_USAGE).is_some());
        assert!(parsed.key_usage().is_none());
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn malformed_extensions() {
        // Duplicate extension.
        let ext = Value::Sequence(vec![
            Value::Oid(oid::CE_KEY_USAGE.to_oid()),
            Value::OctetString(Bytes::from_static(b"\x03\x02\x07\x80")),
        ]);
        let twice = Value::Sequence(vec![ext.clone(), ext]);
        assert!(Extensions::from_value(&twice).is_err());

        // Undecodable non-critical extension is kept.
        let exts = Extensions::from_value(&Value::Sequence(vec![
            Value::Sequence(vec![
                Value::Oid(oid::CE_CERTIFICATE_POLICIES.to_oid()),
                Value::OctetString(Bytes::from_static(b"\x30\x05")),
            ])
        ])).unwrap();
        assert_eq!(
            exts.get(&oid::CE_CERTIFICATE_POLICIES).unwrap().value(),
            &Value::OctetString(Bytes::from_static(b"\x30\x05"))
        );

        // Undecodable critical extension is not.
        assert!(Extensions::from_value(&Value::Sequence(vec![
            Value::Sequence(vec![
                Value::Oid(oid::CE_CERTIFICATE_POLICIES.to_oid()),
                Value::Boolean(true),
                Value::OctetString(Bytes::from_static(b"\x30\x05")),
            ])
        ])).is_err());

        // Key usage of the wrong type.
        assert!(Extensions::from_value(&Value::Sequence(vec![
            Value::Sequence(vec![
                Value::Oid(oid::CE_KEY_USAGE.to_oid()),
                Value::OctetString(Bytes::from_static(b"\x05\x00")),
            ])
        ])).is_err());
    }
}
