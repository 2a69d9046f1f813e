//! Object identifiers.
//!
//! This module provides the [`Oid`] type and collects all the object
//! identifiers used at various places in this crate in one central place.
//! They are public so you can refer to them when interpreting the values
//! returned by [`CertificateInfo::extension_for`].
//!
//! [`CertificateInfo::extension_for`]: crate::cert::CertificateInfo::extension_for

use std::{cmp, error, fmt, hash};
use std::str::FromStr;
use crate::der::EncodeError;


//------------ Oid -----------------------------------------------------------

/// An object identifier.
///
/// The identifier is kept as its sequence of integer components, the
/// _arcs._ Values can be compared with each other independently of the
/// underlying storage, so an owned `Oid` compares equal to one of the
/// [`ConstOid`] constants defined in this module if they have the same
/// components. Ordering is component-wise.
///
/// The canonical string representation is the components in decimal
/// separated by dots, e.g., `2.5.29.15` for the key usage extension.
#[derive(Clone, Copy)]
pub struct Oid<T = Box<[u64]>>(pub T);

/// An object identifier that can be defined as a constant.
pub type ConstOid = Oid<&'static [u64]>;

impl Oid {
    /// Creates an identifier from a slice of components.
    ///
    /// Fails if there are fewer than two components or if the first two
    /// components violate the rules of X.660: the first component must be
    /// 0, 1, or 2 and, unless it is 2, the second must be less than 40.
    pub fn from_components(components: &[u64]) -> Result<Self, OidError> {
        check_components(components)?;
        Ok(Oid(components.into()))
    }

    /// Decodes the content octets of a BER encoded object identifier.
    ///
    /// Each sub-identifier is encoded in base 128 with the high bit set on
    /// all but the last octet. The first sub-identifier combines the first
    /// two components as `40 * first + second`. A sub-identifier starting
    /// with an octet of `0x80` is not minimally encoded and is rejected.
    pub fn from_content(content: &[u8]) -> Result<Self, OidError> {
        if content.is_empty() {
            return Err(OidError::new("empty object identifier"))
        }
        let mut res = Vec::new();
        let mut current: u64 = 0;
        let mut start = true;
        for &octet in content {
            if start && octet == 0x80 {
                return Err(OidError::new(
                    "non-minimal object identifier component"
                ))
            }
            if current.leading_zeros() < 7 {
                return Err(OidError::new(
                    "object identifier component too large"
                ))
            }
            current = (current << 7) | u64::from(octet & 0x7F);
            if octet & 0x80 == 0 {
                if res.is_empty() {
                    let (first, second) = match current {
                        0..=39 => (0, current),
                        40..=79 => (1, current - 40),
                        _ => (2, current - 80)
                    };
                    res.push(first);
                    res.push(second);
                }
                else {
                    res.push(current);
                }
                current = 0;
                start = true;
            }
            else {
                start = false;
            }
        }
        if !start {
            return Err(OidError::new("truncated object identifier"))
        }
        Ok(Oid(res.into()))
    }
}

impl<T: AsRef<[u64]>> Oid<T> {
    /// Returns the components of the identifier.
    pub fn components(&self) -> &[u64] {
        self.0.as_ref()
    }

    /// Converts the identifier into an owned identifier.
    pub fn to_oid(&self) -> Oid {
        Oid(self.components().into())
    }

    /// Appends the BER content octets of the identifier to `target`.
    ///
    /// The components of a value built directly through the public field
    /// are not checked on construction, so they are checked here. Nothing
    /// is appended if they are invalid.
    pub fn write_content(
        &self, target: &mut Vec<u8>
    ) -> Result<(), EncodeError> {
        let components = self.components();
        check_components(components).map_err(|_| {
            EncodeError::new("invalid object identifier components")
        })?;
        write_subidentifier(components[0] * 40 + components[1], target);
        for &item in &components[2..] {
            write_subidentifier(item, target);
        }
        Ok(())
    }
}

fn check_components(components: &[u64]) -> Result<(), OidError> {
    if components.len() < 2 {
        return Err(OidError::new(
            "object identifier needs at least two components"
        ))
    }
    match components[0] {
        0 | 1 => {
            if components[1] >= 40 {
                return Err(OidError::new(
                    "second object identifier component out of range"
                ))
            }
        }
        2 => {
            if components[1] > u64::MAX - 80 {
                return Err(OidError::new(
                    "second object identifier component out of range"
                ))
            }
        }
        _ => {
            return Err(OidError::new(
                "first object identifier component out of range"
            ))
        }
    }
    Ok(())
}

fn write_subidentifier(mut value: u64, target: &mut Vec<u8>) {
    let mut buf = [0u8; 10];
    let mut pos = buf.len() - 1;
    buf[pos] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        pos -= 1;
        buf[pos] = (value & 0x7F) as u8 | 0x80;
        value >>= 7;
    }
    target.extend_from_slice(&buf[pos..]);
}


//--- From and FromStr

impl From<ConstOid> for Oid {
    fn from(oid: ConstOid) -> Self {
        oid.to_oid()
    }
}

impl<'a> From<&'a ConstOid> for Oid {
    fn from(oid: &'a ConstOid) -> Self {
        oid.to_oid()
    }
}

impl FromStr for Oid {
    type Err = OidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = Vec::new();
        for item in s.split('.') {
            if item.is_empty() || !item.bytes().all(|ch| ch.is_ascii_digit()) {
                return Err(OidError::new(
                    "non-numeric object identifier component"
                ))
            }
            components.push(u64::from_str(item).map_err(|_| {
                OidError::new("object identifier component too large")
            })?);
        }
        Oid::from_components(&components)
    }
}


//--- PartialEq and Eq

impl<T: AsRef<[u64]>, U: AsRef<[u64]>> PartialEq<Oid<U>> for Oid<T> {
    fn eq(&self, other: &Oid<U>) -> bool {
        self.components() == other.components()
    }
}

impl<T: AsRef<[u64]>> Eq for Oid<T> { }


//--- PartialOrd and Ord

impl<T: AsRef<[u64]>, U: AsRef<[u64]>> PartialOrd<Oid<U>> for Oid<T> {
    fn partial_cmp(&self, other: &Oid<U>) -> Option<cmp::Ordering> {
        Some(self.components().cmp(other.components()))
    }
}

impl<T: AsRef<[u64]>> Ord for Oid<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.components().cmp(other.components())
    }
}


//--- Hash

impl<T: AsRef<[u64]>> hash::Hash for Oid<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.components().hash(state)
    }
}


//--- Display and Debug

impl<T: AsRef<[u64]>> fmt::Display for Oid<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut components = self.components().iter();
        if let Some(first) = components.next() {
            write!(f, "{}", first)?;
        }
        for item in components {
            write!(f, ".{}", item)?;
        }
        Ok(())
    }
}

impl<T: AsRef<[u64]>> fmt::Debug for Oid<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}


//--- Deserialize and Serialize

#[cfg(feature = "serde")]
impl<T: AsRef<[u64]>> serde::Serialize for Oid<T> {
    fn serialize<S: serde::Serializer>(
        &self, serializer: S
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Oid {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D
    ) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Oid::from_str(&s).map_err(serde::de::Error::custom)
    }
}


//------------ OidError ------------------------------------------------------

/// A value could not be converted into an object identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OidError(&'static str);

impl OidError {
    pub(crate) fn new(msg: &'static str) -> Self {
        OidError(msg)
    }
}

impl fmt::Display for OidError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl error::Error for OidError { }


//------------ Attribute Types -----------------------------------------------

/// [RFC 4519](https://tools.ietf.org/html/rfc4519) `cn`
pub const AT_COMMON_NAME: ConstOid = Oid(&[2, 5, 4, 3]);
pub const AT_SURNAME: ConstOid = Oid(&[2, 5, 4, 4]);
pub const AT_SERIAL_NUMBER: ConstOid = Oid(&[2, 5, 4, 5]);
pub const AT_COUNTRY_NAME: ConstOid = Oid(&[2, 5, 4, 6]);
pub const AT_LOCALITY_NAME: ConstOid = Oid(&[2, 5, 4, 7]);
pub const AT_STATE_OR_PROVINCE_NAME: ConstOid = Oid(&[2, 5, 4, 8]);
pub const AT_ORGANIZATION_NAME: ConstOid = Oid(&[2, 5, 4, 10]);
pub const AT_ORGANIZATIONAL_UNIT_NAME: ConstOid = Oid(&[2, 5, 4, 11]);
pub const AT_DESCRIPTION: ConstOid = Oid(&[2, 5, 4, 13]);
pub const AT_GIVEN_NAME: ConstOid = Oid(&[2, 5, 4, 42]);

/// [RFC 2985](https://tools.ietf.org/html/rfc2985) `emailAddress`
///
/// Deprecated in favour of the subject alternative name but still widely
/// used in subject names.
pub const PKCS9_EMAIL_ADDRESS: ConstOid
    = Oid(&[1, 2, 840, 113549, 1, 9, 1]);

/// [RFC 2985](https://tools.ietf.org/html/rfc2985) `extensionRequest`
///
/// The attribute carrying the requested extensions in a PKCS #10
/// certification request.
pub const PKCS9_EXTENSION_REQUEST: ConstOid
    = Oid(&[1, 2, 840, 113549, 1, 9, 14]);


//------------ Certificate Extensions ----------------------------------------

pub const CE_SUBJECT_KEY_IDENTIFIER: ConstOid = Oid(&[2, 5, 29, 14]);
pub const CE_KEY_USAGE: ConstOid = Oid(&[2, 5, 29, 15]);
pub const CE_SUBJECT_ALT_NAME: ConstOid = Oid(&[2, 5, 29, 17]);
pub const CE_ISSUER_ALT_NAME: ConstOid = Oid(&[2, 5, 29, 18]);
pub const CE_BASIC_CONSTRAINTS: ConstOid = Oid(&[2, 5, 29, 19]);
pub const CE_CERTIFICATE_POLICIES: ConstOid = Oid(&[2, 5, 29, 32]);
pub const CE_AUTHORITY_KEY_IDENTIFIER: ConstOid = Oid(&[2, 5, 29, 35]);
pub const CE_EXTENDED_KEY_USAGE: ConstOid = Oid(&[2, 5, 29, 37]);


//------------ Extended Key Usage Purposes -----------------------------------

/// [RFC 5280](https://tools.ietf.org/html/rfc5280) `id-kp-serverAuth`
pub const KP_SERVER_AUTH: ConstOid = Oid(&[1, 3, 6, 1, 5, 5, 7, 3, 1]);

/// [RFC 5280](https://tools.ietf.org/html/rfc5280) `id-kp-clientAuth`
pub const KP_CLIENT_AUTH: ConstOid = Oid(&[1, 3, 6, 1, 5, 5, 7, 3, 2]);

/// [RFC 5280](https://tools.ietf.org/html/rfc5280) `id-kp-codeSigning`
pub const KP_CODE_SIGNING: ConstOid = Oid(&[1, 3, 6, 1, 5, 5, 7, 3, 3]);

/// [RFC 5280](https://tools.ietf.org/html/rfc5280) `id-kp-emailProtection`
pub const KP_EMAIL_PROTECTION: ConstOid = Oid(&[1, 3, 6, 1, 5, 5, 7, 3, 4]);

pub const KP_TIME_STAMPING: ConstOid = Oid(&[1, 3, 6, 1, 5, 5, 7, 3, 8]);
pub const KP_OCSP_SIGNING: ConstOid = Oid(&[1, 3, 6, 1, 5, 5, 7, 3, 9]);


//------------ Algorithms ----------------------------------------------------

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `rsaEncryption`
///
/// Identifies an RSA public key with no limitation to either RSASSA-PSS or
/// RSAES-OEAP.
pub const RSA_ENCRYPTION: ConstOid
    = Oid(&[1, 2, 840, 113549, 1, 1, 1]);

/// [RFC 3279](https://tools.ietf.org/html/rfc3279) `sha1WithRSAEncryption`
pub const SHA1_WITH_RSA_ENCRYPTION: ConstOid
    = Oid(&[1, 2, 840, 113549, 1, 1, 5]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `sha256WithRSAEncryption`
///
/// Identifies the PKCS #1 version 1.5 signature algorithm with SHA-256.
pub const SHA256_WITH_RSA_ENCRYPTION: ConstOid
    = Oid(&[1, 2, 840, 113549, 1, 1, 11]);

/// [RFC 5480](https://tools.ietf.org/html/rfc5480) `id-ecPublicKey`
pub const EC_PUBLIC_KEY: ConstOid = Oid(&[1, 2, 840, 10045, 2, 1]);

/// [RFC 5480](https://tools.ietf.org/html/rfc5480) `secp256r1`
pub const SECP256R1: ConstOid = Oid(&[1, 2, 840, 10045, 3, 1, 7]);

/// [RFC 5758](https://tools.ietf.org/html/rfc5758) `ecdsa-with-SHA256`
pub const ECDSA_WITH_SHA256: ConstOid = Oid(&[1, 2, 840, 10045, 4, 3, 2]);

/// [RFC 8410](https://tools.ietf.org/html/rfc8410) `id-Ed25519`
pub const ED25519: ConstOid = Oid(&[1, 3, 101, 112]);


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_str_and_display() {
        let oid = Oid::from_str("2.5.29.15").unwrap();
        assert_eq!(oid, CE_KEY_USAGE);
        assert_eq!(oid.to_string(), "2.5.29.15");
        assert_eq!(
            PKCS9_EMAIL_ADDRESS.to_string(), "1.2.840.113549.1.9.1"
        );
    }

    #[test]
    fn malformed_strings() {
        assert!(Oid::from_str("").is_err());
        assert!(Oid::from_str("2").is_err());
        assert!(Oid::from_str("2.x.3").is_err());
        assert!(Oid::from_str("2..3").is_err());
        assert!(Oid::from_str("2.5.").is_err());
        assert!(Oid::from_str("-1.5").is_err());
        assert!(Oid::from_str("3.5").is_err());
        assert!(Oid::from_str("1.40").is_err());
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serde_as_string() {
        let json = serde_json::to_string(&CE_SUBJECT_ALT_NAME).unwrap();
        assert_eq!(json, "\"2.5.29.17\"");
        let oid: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(oid, CE_SUBJECT_ALT_NAME);
        assert!(serde_json::from_str::<Oid>("\"2.5.\"").is_err());
    }

    #[test]
    fn ordering_is_component_wise() {
        let a = Oid::from_str("1.2.9").unwrap();
        let b = Oid::from_str("1.2.10").unwrap();
        let c = Oid::from_str("1.2.10.1").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(KP_SERVER_AUTH < KP_CLIENT_AUTH);
    }

    #[test]
    fn content_encoding() {
        let mut target = Vec::new();
        SHA256_WITH_RSA_ENCRYPTION.write_content(&mut target).unwrap();
        assert_eq!(
            target,
            b"\x2a\x86\x48\x86\xf7\x0d\x01\x01\x0b".as_ref()
        );
        assert_eq!(
            Oid::from_content(&target).unwrap(),
            SHA256_WITH_RSA_ENCRYPTION
        );

        let mut target = Vec::new();
        CE_KEY_USAGE.write_content(&mut target).unwrap();
        assert_eq!(target, b"\x55\x1d\x0f".as_ref());

        // 2.999 has a first sub-identifier above 127.
        let oid = Oid::from_str("2.999.3").unwrap();
        let mut target = Vec::new();
        oid.write_content(&mut target).unwrap();
        assert_eq!(target, b"\x88\x37\x03".as_ref());
        assert_eq!(Oid::from_content(&target).unwrap(), oid);
    }

    #[test]
    fn malformed_content() {
        assert!(Oid::from_content(b"").is_err());
        assert!(Oid::from_content(b"\x55\x1d\x8f").is_err());
        assert!(Oid::from_content(b"\x55\x80\x1d").is_err());
        assert!(
            Oid::from_content(b"\xff\xff\xff\xff\xff\xff\xff\xff\xff\x7f")
                .is_err()
        );
    }
}
