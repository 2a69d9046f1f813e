//! X.509 certificates.
//!
//! This module implements reading certificates in the type
//! [`CertificateInfo`] and creating self-signed certificates and
//! certificate signing requests in the type [`CertificateRequest`].
//!
//! Certificates are defined in [RFC 5280]. Only a single certificate is
//! looked at. There is no chain validation and no revocation checking.
//!
//! [RFC 5280]: https://tools.ietf.org/html/rfc5280

pub use self::ext::{
    BasicConstraints, Extension, Extensions, GeneralName, GeneralNameType,
    KeyUsage, SanValue,
};
pub use self::request::{CertificateRequest, RequestState};

pub mod ext;
pub mod request;

use std::collections::{BTreeMap, BTreeSet};
use bytes::Bytes;
use crate::der::{self, BitString, Class, Decoder, Integer, Value};
use crate::crypto::{
    PublicKey, Signature, SignatureAlgorithm, Verifier,
};
use crate::error::Error;
use crate::oid::Oid;
use crate::pem::Pem;
use crate::x509::{AlgorithmIdentifier, Name, Time, Validity};


//------------ CertificateInfo -----------------------------------------------

/// A parsed certificate.
///
/// ```text
/// Certificate  ::=  SEQUENCE  {
///      tbsCertificate       TBSCertificate,
///      signatureAlgorithm   AlgorithmIdentifier,
///      signatureValue       BIT STRING  }
///
/// TBSCertificate  ::=  SEQUENCE  {
///      version         [0]  EXPLICIT Version DEFAULT v1,
///      serialNumber         CertificateSerialNumber,
///      signature            AlgorithmIdentifier,
///      issuer               Name,
///      validity             Validity,
///      subject              Name,
///      subjectPublicKeyInfo SubjectPublicKeyInfo,
///      issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
///      subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
///      extensions      [3]  EXPLICIT Extensions OPTIONAL }
/// ```
///
/// The value keeps the original octets of the certificate and of the
/// to-be-signed part. Signatures are always verified over the latter, so
/// any quirks in the encoding don’t matter.
///
/// Everything is immutable. In particular, the names returned by
/// [`subject`][Self::subject] and [`issuer`][Self::issuer] refuse to be
/// changed.
#[derive(Clone, Debug)]
pub struct CertificateInfo {
    /// The complete encoded certificate.
    bytes: Bytes,

    /// The encoded to-be-signed certificate.
    tbs: Bytes,

    /// The value tree of the certificate.
    root: Value,

    /// The version as encoded, i.e., 0 for v1.
    version: u8,

    serial_number: Integer,
    signature_algorithm: AlgorithmIdentifier,
    issuer: Name,
    validity: Validity,
    subject: Name,
    public_key: PublicKey,
    extensions: Extensions,
    signature: BitString,
}

impl CertificateInfo {
    /// Parses a DER encoded certificate.
    pub fn decode(data: impl Into<Bytes>) -> Result<Self, Error> {
        let bytes = data.into();
        let root = der::decode(bytes.clone())?;

        let (tbs_value, outer_algorithm, signature) = match root.as_sequence() {
            Some([tbs, algorithm, Value::BitString(signature)]) => {
                (tbs, AlgorithmIdentifier::from_value(algorithm)?, signature)
            }
            _ => {
                return Err(Error::MalformedCertificate(
                    "invalid certificate structure"
                ))
            }
        };

        let tbs = {
            let mut outer = Decoder::new(bytes.clone());
            let mut cert = outer.take_sequence()?;
            cert.take_raw()?
        };

        let items = match tbs_value.as_sequence() {
            Some(items) => items,
            None => {
                return Err(Error::MalformedCertificate(
                    "invalid to-be-signed certificate"
                ))
            }
        };
        let mut items = items.iter().peekable();

        let version = match items.peek().copied() {
            Some(Value::Tagged(tagged))
                if tagged.class == Class::Context && tagged.number == 0
            => {
                items.next();
                if !tagged.explicit {
                    return Err(Error::MalformedCertificate("invalid version"))
                }
                match tagged.value().as_integer().and_then(|v| v.to_u64()) {
                    Some(version) if version <= 2 => version as u8,
                    _ => {
                        return Err(Error::MalformedCertificate(
                            "invalid version"
                        ))
                    }
                }
            }
            _ => 0
        };

        let serial_number = match items.next() {
            Some(Value::Integer(serial)) => serial.clone(),
            _ => {
                return Err(Error::MalformedCertificate(
                    "invalid serial number"
                ))
            }
        };

        let signature_algorithm = AlgorithmIdentifier::from_value(
            next_item(&mut items)?
        )?;
        if signature_algorithm != outer_algorithm {
            return Err(Error::MalformedCertificate(
                "signature algorithm mismatch"
            ))
        }

        let issuer = Name::from_value(next_item(&mut items)?)?;
        let validity = Validity::from_value(next_item(&mut items)?)?;
        let subject = Name::from_value(next_item(&mut items)?)?;
        let public_key = PublicKey::from_value(next_item(&mut items)?)?;

        let mut extensions = None;
        let mut last_number = 0;
        for item in items {
            let tagged = match item.as_tagged() {
                Some(tagged) if tagged.class == Class::Context => tagged,
                _ => {
                    return Err(Error::MalformedCertificate(
                        "unexpected trailing field"
                    ))
                }
            };
            if tagged.number <= last_number {
                return Err(Error::MalformedCertificate(
                    "unexpected trailing field"
                ))
            }
            last_number = tagged.number;
            match tagged.number {
                1 | 2 if version >= 1 => { }
                3 if version == 2 && tagged.explicit => {
                    extensions = Some(
                        Extensions::from_value(tagged.value())?
                    );
                }
                _ => {
                    return Err(Error::MalformedCertificate(
                        "unexpected trailing field"
                    ))
                }
            }
        }

        Ok(CertificateInfo {
            bytes,
            tbs,
            version,
            serial_number,
            signature_algorithm,
            issuer,
            validity,
            subject,
            public_key,
            extensions: extensions.unwrap_or_default(),
            signature: signature.clone(),
            root,
        })
    }

    /// Parses a PEM encoded certificate.
    ///
    /// The label of the first PEM block must be `CERTIFICATE`.
    pub fn from_pem(text: &str) -> Result<Self, Error> {
        let pem = Pem::parse(text)?;
        if pem.label() != Pem::CERTIFICATE {
            return Err(Error::MalformedPem("not a certificate"))
        }
        Self::decode(pem.into_contents())
    }

    /// Returns the certificate in PEM format.
    pub fn to_pem(&self) -> String {
        Pem::new(Pem::CERTIFICATE, self.bytes.clone()).to_string()
    }

    /// Returns the encoded certificate.
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Returns the encoded to-be-signed part of the certificate.
    pub fn tbs_bytes(&self) -> &Bytes {
        &self.tbs
    }

    /// Returns the value tree of the complete certificate.
    pub fn root(&self) -> &Value {
        &self.root
    }
}

fn next_item<'a>(
    items: &mut impl Iterator<Item = &'a Value>
) -> Result<&'a Value, Error> {
    items.next().ok_or(Error::MalformedCertificate(
        "incomplete to-be-signed certificate"
    ))
}


/// # Data Access
///
impl CertificateInfo {
    /// Returns the version of the certificate, 1 to 3.
    pub fn version(&self) -> u8 {
        self.version + 1
    }

    pub fn serial_number(&self) -> &Integer {
        &self.serial_number
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    /// Returns the signature if its algorithm is known.
    pub fn signature(&self) -> Option<Signature> {
        let algorithm = SignatureAlgorithm::from_identifier(
            &self.signature_algorithm
        )?;
        if self.signature.unused() != 0 {
            return None
        }
        Some(Signature::new(algorithm, self.signature.octets().clone()))
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn valid_from(&self) -> Time {
        self.validity.not_before()
    }

    pub fn valid_to(&self) -> Time {
        self.validity.not_after()
    }

    pub fn subject_public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns whether this is a self-issued certificate.
    ///
    /// This only compares the issuer and subject names. It doesn’t check
    /// the signature.
    pub fn is_root(&self) -> bool {
        self.issuer == self.subject
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the identifiers of all extensions in order.
    pub fn extension_oids(&self) -> impl Iterator<Item = &Oid> {
        self.extensions.oids()
    }

    /// Returns the value of an extension and whether it is critical.
    pub fn extension_for<T: AsRef<[u64]>>(
        &self, oid: &Oid<T>
    ) -> Option<(&Value, bool)> {
        self.extensions.get(oid).map(|ext| (ext.value(), ext.is_critical()))
    }
}


/// # Policy
///
/// The key usage and extended key usage extensions only restrict the use
/// of the key if they are present and marked critical. A certificate
/// without them or with non-critical ones allows everything.
impl CertificateInfo {
    pub fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.extensions.basic_constraints()
    }

    /// Returns whether the basic constraints mark this a CA certificate.
    pub fn is_certificate_authority(&self) -> bool {
        self.basic_constraints().map(|bc| bc.ca).unwrap_or(false)
    }

    /// Returns the key usage.
    ///
    /// Returns [`KeyUsage::UNSPECIFIED`] if the extension is missing.
    pub fn key_usage(&self) -> KeyUsage {
        self.extensions.key_usage().map(|(ku, _)| ku).unwrap_or(
            KeyUsage::UNSPECIFIED
        )
    }

    /// Returns whether the key may be used for all of `usage`.
    pub fn allows_key_usage(&self, usage: KeyUsage) -> bool {
        match self.extensions.key_usage() {
            Some((ku, true)) => ku.contains(usage),
            _ => true
        }
    }

    /// Returns the extended key usage purposes.
    ///
    /// The set is empty if the extension is missing.
    pub fn extended_key_usage(&self) -> BTreeSet<Oid> {
        self.extensions.extended_key_usage().map(|(eku, _)| eku)
            .unwrap_or_default()
    }

    /// Returns whether the key may be used for all of the given purposes.
    pub fn allows_extended_key_usage<'a, T, I>(&self, purposes: I) -> bool
    where
        T: AsRef<[u64]> + 'a,
        I: IntoIterator<Item = &'a Oid<T>>
    {
        match self.extensions.extended_key_usage() {
            Some((eku, true)) => {
                purposes.into_iter().all(|purpose| {
                    eku.iter().any(|item| item == purpose)
                })
            }
            _ => true
        }
    }

    /// Returns the subject alternative names by type.
    ///
    /// If there is more than one name of a type, only the last one is
    /// included. Use [`subject_alternative_names`] for all of them.
    ///
    /// [`subject_alternative_names`]: Self::subject_alternative_names
    pub fn subject_alternative_name(
        &self
    ) -> BTreeMap<GeneralNameType, SanValue> {
        ext::general_names_to_map(&self.subject_alternative_names())
    }

    /// Returns all subject alternative names in order.
    pub fn subject_alternative_names(&self) -> Vec<GeneralName> {
        self.extensions.subject_alternative_names()
    }

    /// Returns all email addresses of the subject.
    ///
    /// These are the email address attribute of the subject name followed
    /// by the RFC 822 names of the subject alternative name.
    pub fn email_addresses(&self) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        if let Some(addr) = self.subject.email_address() {
            res.push(addr.into())
        }
        for name in self.subject_alternative_names() {
            if let GeneralName::Rfc822(addr) = name {
                if !res.contains(&addr) {
                    res.push(addr)
                }
            }
        }
        res
    }
}


/// # Verification
impl CertificateInfo {
    /// Verifies the signature of the certificate with the given key.
    pub fn verify_signature<V: Verifier>(
        &self, key: &V
    ) -> Result<(), Error> {
        let signature = match self.signature() {
            Some(signature) => signature,
            None => return Err(Error::VerificationFailed)
        };
        key.verify(&self.tbs, &signature)?;
        Ok(())
    }

    /// Returns whether the certificate was signed by the given key.
    pub fn verify_signature_with_key<V: Verifier>(&self, key: &V) -> bool {
        self.verify_signature(key).is_ok()
    }

    /// Verifies that a root certificate is signed with its own key.
    pub fn verify_self_signed(&self) -> Result<(), Error> {
        if !self.is_root() {
            return Err(Error::VerificationFailed)
        }
        self.verify_signature(&self.public_key)
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::der::{Encode, Encoder, Tagged};
    use crate::oid;

    const ROOT: &[u8] = include_bytes!("../../test-data/root.der");
    const LEAF: &[u8] = include_bytes!("../../test-data/leaf.der");
    const KU_CRITICAL: &[u8] = include_bytes!(
        "../../test-data/ku-critical.der"
    );

    #[test]
    fn decode_root() {
        let cert = CertificateInfo::decode(ROOT).unwrap();
        assert_eq!(cert.version(), 3);
        assert!(cert.is_root());
        assert_eq!(cert.subject().common_name(), Some("Test Root"));
        assert_eq!(
            cert.subject().string_for_oid(&oid::AT_ORGANIZATION_NAME),
            Some("Example Org")
        );
        assert_eq!(cert.subject().email_address(), Some("root@example.com"));
        assert_eq!(
            cert.signature_algorithm().oid(), &oid::ECDSA_WITH_SHA256
        );
        assert_eq!(cert.to_bytes().as_ref(), ROOT);
        assert_eq!(&ROOT[4..4 + cert.tbs_bytes().len()], cert.tbs_bytes());
        assert!(cert.valid_from() < cert.valid_to());
    }

    #[test]
    fn root_extensions() {
        let cert = CertificateInfo::decode(ROOT).unwrap();
        assert!(cert.is_certificate_authority());
        assert_eq!(
            cert.basic_constraints(),
            Some(BasicConstraints::new(true, Some(1)))
        );
        assert_eq!(
            cert.key_usage(),
            KeyUsage::DIGITAL_SIGNATURE | KeyUsage::KEY_CERT_SIGN
                | KeyUsage::CRL_SIGN
        );
        assert!(cert.allows_key_usage(KeyUsage::KEY_CERT_SIGN));
        assert!(!cert.allows_key_usage(KeyUsage::KEY_ENCIPHERMENT));

        let (_, critical) = cert.extension_for(&oid::CE_KEY_USAGE).unwrap();
        assert!(critical);
        assert!(cert.extension_for(&oid::CE_CERTIFICATE_POLICIES).is_none());
        assert!(
            cert.extension_oids().any(|item| *item == oid::CE_SUBJECT_ALT_NAME)
        );

        let eku = cert.extended_key_usage();
        assert_eq!(eku.len(), 2);
        assert!(eku.contains(&oid::KP_SERVER_AUTH.to_oid()));
        // Non-critical, so anything goes.
        assert!(cert.allows_extended_key_usage(&[oid::KP_CODE_SIGNING]));

        let san = cert.subject_alternative_name();
        assert_eq!(san[&GeneralNameType::Dns].as_str(), Some("example.com"));
        assert_eq!(
            san[&GeneralNameType::Rfc822].as_str(), Some("alt@example.com")
        );
        assert_eq!(
            san[&GeneralNameType::Uri].as_str(), Some("https://example.com/")
        );
        assert!(san.contains_key(&GeneralNameType::Other(7)));
        assert_eq!(cert.subject_alternative_names().len(), 4);

        assert_eq!(
            cert.email_addresses(),
            vec![
                String::from("root@example.com"),
                String::from("alt@example.com")
            ]
        );
    }

    #[test]
    fn leaf_policy() {
        let cert = CertificateInfo::decode(LEAF).unwrap();
        assert!(!cert.is_root());
        assert!(!cert.is_certificate_authority());
        assert_eq!(cert.serial_number().to_u64(), Some(0x1234));
        assert_eq!(cert.issuer().common_name(), Some("Test Root"));

        // Key usage is not critical.
        assert_eq!(cert.key_usage(), KeyUsage::DIGITAL_SIGNATURE);
        assert!(cert.allows_key_usage(KeyUsage::KEY_CERT_SIGN));

        // Extended key usage is.
        assert!(cert.allows_extended_key_usage(&[oid::KP_EMAIL_PROTECTION]));
        assert!(!cert.allows_extended_key_usage(&[oid::KP_SERVER_AUTH]));
        assert!(cert.allows_extended_key_usage(Vec::<&Oid>::new()));
        assert!(cert.subject_alternative_name().is_empty());
    }

    #[test]
    fn critical_key_usage() {
        let cert = CertificateInfo::decode(KU_CRITICAL).unwrap();
        assert!(cert.allows_key_usage(KeyUsage::DIGITAL_SIGNATURE));
        assert!(!cert.allows_key_usage(
            KeyUsage::DIGITAL_SIGNATURE | KeyUsage::KEY_ENCIPHERMENT
        ));
        assert!(cert.extended_key_usage().is_empty());
        assert!(cert.allows_extended_key_usage(&[oid::KP_SERVER_AUTH]));
    }

    #[test]
    fn verify() {
        let root = CertificateInfo::decode(ROOT).unwrap();
        let leaf = CertificateInfo::decode(LEAF).unwrap();
        let other = CertificateInfo::decode(KU_CRITICAL).unwrap();
        root.verify_self_signed().unwrap();
        other.verify_self_signed().unwrap();
        assert!(leaf.verify_self_signed().is_err());
        assert!(leaf.verify_signature_with_key(root.subject_public_key()));
        assert!(!leaf.verify_signature_with_key(other.subject_public_key()));
        assert!(!root.verify_signature_with_key(leaf.subject_public_key()));
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            CertificateInfo::decode(&ROOT[..ROOT.len() - 1]),
            Err(Error::MalformedInput(_))
        ));
        assert!(matches!(
            CertificateInfo::decode(&b"\x02\x01\x01"[..]),
            Err(Error::MalformedCertificate(_))
        ));

        // Change the outer signature algorithm to something else.
        let root = CertificateInfo::decode(ROOT).unwrap();
        let items = root.root().as_sequence().unwrap();
        let changed = Value::Sequence(vec![
            items[0].clone(),
            AlgorithmIdentifier::new(oid::ED25519, None).to_value(
                &Encoder::new()
            ).unwrap(),
            items[2].clone(),
        ]);
        let changed = Encoder::new().encode(&changed).unwrap();
        assert!(matches!(
            CertificateInfo::decode(changed),
            Err(Error::MalformedCertificate(_))
        ));
    }

    /// Re-encodes the root certificate with different TBS items.
    fn with_tbs_items(
        change: impl FnOnce(&mut Vec<Value>)
    ) -> Result<CertificateInfo, Error> {
        let root = CertificateInfo::decode(ROOT).unwrap();
        let items = root.root().as_sequence().unwrap();
        let mut tbs = items[0].as_sequence().unwrap().to_vec();
        change(&mut tbs);
        let changed = Value::Sequence(vec![
            Value::Sequence(tbs), items[1].clone(), items[2].clone()
        ]);
        CertificateInfo::decode(Encoder::new().encode(&changed).unwrap())
    }

    fn unique_id(number: u32) -> Value {
        Value::Tagged(Tagged::implicit(
            number, Value::OctetString(Bytes::from_static(b"\x00\x5a"))
        ))
    }

    fn version(version: i64) -> Value {
        Value::Tagged(Tagged::explicit(0, Value::Integer(version.into())))
    }

    #[test]
    fn trailing_fields() {
        // The root has the version first and extensions last.
        let cert = with_tbs_items(|items| {
            items.insert(7, unique_id(2));
            items.insert(7, unique_id(1));
        }).unwrap();
        assert_eq!(cert.version(), 3);
        assert!(cert.key_usage().contains(KeyUsage::KEY_CERT_SIGN));

        let cert = with_tbs_items(|items| {
            items[0] = version(1);
            items.pop();
            items.push(unique_id(1));
        }).unwrap();
        assert_eq!(cert.version(), 2);
        assert!(cert.extensions().is_empty());

        // Version 1 with extensions.
        assert!(matches!(
            with_tbs_items(|items| { items.remove(0); }),
            Err(Error::MalformedCertificate(_))
        ));
        assert!(matches!(
            with_tbs_items(|items| items[0] = version(0)),
            Err(Error::MalformedCertificate(_))
        ));

        // Version 2 with extensions.
        assert!(matches!(
            with_tbs_items(|items| items[0] = version(1)),
            Err(Error::MalformedCertificate(_))
        ));

        // Version 1 with a unique identifier.
        assert!(matches!(
            with_tbs_items(|items| {
                items.remove(0);
                items.pop();
                items.push(unique_id(1));
            }),
            Err(Error::MalformedCertificate(_))
        ));

        // Fields out of order.
        assert!(matches!(
            with_tbs_items(|items| {
                items.insert(7, unique_id(1));
                items.insert(7, unique_id(2));
            }),
            Err(Error::MalformedCertificate(_))
        ));
        assert!(matches!(
            with_tbs_items(|items| items.push(unique_id(1))),
            Err(Error::MalformedCertificate(_))
        ));
        assert!(with_tbs_items(|items| items.insert(7, unique_id(1))).is_ok());
    }

    #[test]
    fn pem() {
        let root = CertificateInfo::decode(ROOT).unwrap();
        let pem = root.to_pem();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        let parsed = CertificateInfo::from_pem(&pem).unwrap();
        assert_eq!(parsed.to_bytes(), root.to_bytes());
    }
}
