//! Building certificate requests and self-signed certificates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use bytes::Bytes;
use log::debug;
use crate::oid;
use crate::crypto::{PublicKey, Signature, SignatureAlgorithm, Signer};
use crate::der::{BitString, Encode, Encoder, Integer, Tagged, Value};
use crate::error::Error;
use crate::oid::Oid;
use crate::x509::{Name, Time, Validity};
use super::ext::{
    BasicConstraints, Extension, Extensions, GeneralName, KeyUsage,
};


//------------ CertificateRequest --------------------------------------------

/// A certificate request under construction.
///
/// A request starts out [blank][RequestState::Blank] and becomes
/// [populated][RequestState::Populated] with the first change. From the
/// request, either an unsigned or a signed PKCS #10 certification request
/// can be produced any number of times, or it can be turned into a
/// self-signed certificate through
/// [`self_sign_with_private_key`][Self::self_sign_with_private_key]. After
/// that, the request is [signed][RequestState::Signed] and all attempts to
/// change it fail with [`Error::RequestAlreadySigned`].
///
/// The request only borrows the public key. The private key stays with a
/// [`Signer`].
#[derive(Clone, Debug)]
pub struct CertificateRequest<'a> {
    public_key: Option<&'a PublicKey>,
    subject: Name,
    valid_from: Option<Time>,
    valid_to: Option<Time>,
    extensions: Extensions,
    force_printable_strings: bool,
    state: RequestState,
}

impl<'a> CertificateRequest<'a> {
    /// Creates a new request for the given public key.
    pub fn new(public_key: &'a PublicKey) -> Self {
        let mut res = Self::blank();
        res.public_key = Some(public_key);
        res
    }

    /// Creates a new request without a public key.
    ///
    /// The key needs to be added through
    /// [`set_public_key`][Self::set_public_key] before anything can be
    /// encoded.
    pub fn blank() -> Self {
        CertificateRequest {
            public_key: None,
            subject: Name::for_request(),
            valid_from: None,
            valid_to: None,
            extensions: Extensions::new(),
            force_printable_strings: false,
            state: RequestState::Blank,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn public_key(&self) -> Option<&'a PublicKey> {
        self.public_key
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    /// Returns the subject name for changing it.
    ///
    /// Once the request is signed, all changes to the name fail.
    pub fn subject_mut(&mut self) -> &mut Name {
        if self.state == RequestState::Blank {
            self.state = RequestState::Populated
        }
        &mut self.subject
    }

    pub fn valid_from(&self) -> Option<Time> {
        self.valid_from
    }

    pub fn valid_to(&self) -> Option<Time> {
        self.valid_to
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn forces_printable_strings(&self) -> bool {
        self.force_printable_strings
    }

    fn check_writable(&mut self) -> Result<(), Error> {
        match self.state {
            RequestState::Signed => Err(Error::RequestAlreadySigned),
            _ => {
                self.state = RequestState::Populated;
                Ok(())
            }
        }
    }

    fn require_public_key(&self) -> Result<&'a PublicKey, Error> {
        self.public_key.ok_or(Error::IncompleteRequest("missing public key"))
    }

    fn encoder(&self) -> Encoder {
        Encoder::new().force_printable_strings(self.force_printable_strings)
    }
}


/// # Changing the Request
///
impl<'a> CertificateRequest<'a> {
    pub fn set_public_key(
        &mut self, public_key: &'a PublicKey
    ) -> Result<(), Error> {
        self.check_writable()?;
        self.public_key = Some(public_key);
        Ok(())
    }

    /// Replaces the subject with a copy of the given name.
    pub fn set_subject(&mut self, subject: &Name) -> Result<(), Error> {
        self.check_writable()?;
        self.subject = subject.to_request_name();
        Ok(())
    }

    pub fn set_valid_from(&mut self, time: Time) -> Result<(), Error> {
        self.check_writable()?;
        self.valid_from = Some(time);
        Ok(())
    }

    pub fn set_valid_to(&mut self, time: Time) -> Result<(), Error> {
        self.check_writable()?;
        self.valid_to = Some(time);
        Ok(())
    }

    /// Adds an extension, replacing one with the same identifier.
    pub fn set_extension(
        &mut self, oid: impl Into<Oid>, critical: bool, value: Value
    ) -> Result<(), Error> {
        self.check_writable()?;
        self.extensions.insert(Extension::new(oid, critical, value));
        Ok(())
    }

    /// Removes an extension.
    ///
    /// Returns whether the extension was present.
    pub fn remove_extension<T: AsRef<[u64]>>(
        &mut self, oid: &Oid<T>
    ) -> Result<bool, Error> {
        self.check_writable()?;
        Ok(self.extensions.remove(oid).is_some())
    }

    /// Sets the key usage.
    ///
    /// The extension is marked critical. Setting
    /// [`KeyUsage::UNSPECIFIED`] removes it.
    pub fn set_key_usage(&mut self, usage: KeyUsage) -> Result<(), Error> {
        if usage.is_unspecified() {
            return self.remove_extension(&oid::CE_KEY_USAGE).map(|_| ())
        }
        let value = usage.to_value(&self.encoder())?;
        self.set_extension(oid::CE_KEY_USAGE, true, value)
    }

    /// Sets the extended key usage.
    ///
    /// The extension is not critical. An empty list of purposes removes
    /// it.
    pub fn set_extended_key_usage<I>(&mut self, purposes: I) -> Result<(), Error>
    where I: IntoIterator, I::Item: Into<Oid> {
        let purposes: Vec<_> = purposes.into_iter().map(|purpose| {
            Value::Oid(purpose.into())
        }).collect();
        if purposes.is_empty() {
            return self.remove_extension(
                &oid::CE_EXTENDED_KEY_USAGE
            ).map(|_| ())
        }
        self.set_extension(
            oid::CE_EXTENDED_KEY_USAGE, false, Value::Sequence(purposes)
        )
    }

    /// Sets the basic constraints.
    ///
    /// The extension is marked critical.
    pub fn set_basic_constraints(
        &mut self, constraints: BasicConstraints
    ) -> Result<(), Error> {
        let value = constraints.to_value(&self.encoder())?;
        self.set_extension(oid::CE_BASIC_CONSTRAINTS, true, value)
    }

    /// Sets the subject alternative names.
    ///
    /// An empty list removes the extension.
    pub fn set_subject_alternative_names(
        &mut self, names: Vec<GeneralName>
    ) -> Result<(), Error> {
        if names.is_empty() {
            return self.remove_extension(
                &oid::CE_SUBJECT_ALT_NAME
            ).map(|_| ())
        }
        let encoder = self.encoder();
        let names = names.iter().map(|name| {
            name.to_value(&encoder)
        }).collect::<Result<_, _>>()?;
        self.set_extension(
            oid::CE_SUBJECT_ALT_NAME, false, Value::Sequence(names)
        )
    }

    /// Adds the subject key identifier derived from the public key.
    pub fn set_subject_key_identifier(&mut self) -> Result<(), Error> {
        let key_id = self.require_public_key()?.key_identifier();
        self.set_extension(
            oid::CE_SUBJECT_KEY_IDENTIFIER, false,
            Value::OctetString(Bytes::copy_from_slice(key_id.as_slice()))
        )
    }

    /// Sets whether text should be encoded as PrintableString if possible.
    pub fn set_force_printable_strings(
        &mut self, force: bool
    ) -> Result<(), Error> {
        self.check_writable()?;
        self.force_printable_strings = force;
        Ok(())
    }
}


/// # Producing Output
///
impl<'a> CertificateRequest<'a> {
    /// Returns the encoded unsigned certification request info.
    ///
    /// ```text
    /// CertificationRequestInfo ::= SEQUENCE {
    ///      version       INTEGER { v1(0) } (v1,...),
    ///      subject       Name,
    ///      subjectPKInfo SubjectPublicKeyInfo,
    ///      attributes    [0] Attributes }
    /// ```
    ///
    /// Extensions are included as an extension request attribute.
    pub fn request_data(&self) -> Result<Bytes, Error> {
        if self.state == RequestState::Signed {
            return Err(Error::RequestAlreadySigned)
        }
        Ok(self.encoder().encode(&self.request_info()?)?)
    }

    /// Returns an encoded signed certification request.
    ///
    /// ```text
    /// CertificationRequest ::= SEQUENCE {
    ///      certificationRequestInfo CertificationRequestInfo,
    ///      signatureAlgorithm       AlgorithmIdentifier,
    ///      signature                BIT STRING }
    /// ```
    ///
    /// This doesn’t change the state of the request.
    pub fn signed_request_data<S: Signer>(
        &self, signer: &S, key: &S::KeyId
    ) -> Result<Bytes, Error> {
        if self.state == RequestState::Signed {
            return Err(Error::RequestAlreadySigned)
        }
        let encoder = self.encoder();
        let info = self.request_info()?;
        let signature = self.sign_data(
            signer, key, &encoder.encode(&info)?
        )?;
        Ok(encoder.encode(&signed_value(info, signature, &encoder)?)?)
    }

    /// Signs the request with the private key of its own public key.
    ///
    /// Returns the encoded certificate. Missing validity times default to
    /// now and one year from the start. The certificate gets a fresh
    /// serial number and the subject as issuer.
    ///
    /// Signing fails if `key` is not the private key for the request’s
    /// public key. If it succeeds, the request can no longer be changed.
    pub fn self_sign_with_private_key<S: Signer>(
        &mut self, signer: &S, key: &S::KeyId
    ) -> Result<Bytes, Error> {
        if self.state == RequestState::Signed {
            return Err(Error::RequestAlreadySigned)
        }
        let public_key = self.require_public_key()?;
        let not_before = self.valid_from.unwrap_or_else(Time::now)
            .truncated();
        let not_after = match self.valid_to {
            Some(time) => time.truncated(),
            None => {
                Time::years_from_date(1, not_before.to_datetime()).ok_or(
                    Error::IncompleteRequest("validity start too late")
                )?
            }
        };
        if not_after < not_before {
            return Err(Error::IncompleteRequest(
                "validity ends before it starts"
            ))
        }
        let serial_number = fresh_serial_number();

        let encoder = self.encoder();
        let algorithm = signature_algorithm(public_key)?;
        let mut tbs = vec![
            Value::Tagged(Tagged::explicit(0, Value::Integer(2i64.into()))),
            Value::Integer(serial_number.clone()),
            algorithm.identifier().to_value(&encoder)?,
            self.subject.to_value(&encoder)?,
            Validity::new(not_before, not_after).to_value(&encoder)?,
            self.subject.to_value(&encoder)?,
            public_key.to_value(&encoder)?,
        ];
        if !self.extensions.is_empty() {
            tbs.push(Value::Tagged(Tagged::explicit(
                3, self.extensions.to_value(&encoder)?
            )));
        }
        let tbs = Value::Sequence(tbs);
        let signature = self.sign_data(signer, key, &encoder.encode(&tbs)?)?;
        let res = encoder.encode(&signed_value(tbs, signature, &encoder)?)?;

        debug!(
            "self-signed certificate for '{}' with serial {}",
            self.subject, serial_number
        );
        self.valid_from = Some(not_before);
        self.valid_to = Some(not_after);
        self.subject.lock();
        self.state = RequestState::Signed;
        Ok(res)
    }

    fn request_info(&self) -> Result<Value, Error> {
        let public_key = self.require_public_key()?;
        let encoder = self.encoder();
        let mut attributes = Vec::new();
        if !self.extensions.is_empty() {
            attributes.push(Value::Sequence(vec![
                Value::Oid(oid::PKCS9_EXTENSION_REQUEST.to_oid()),
                Value::Set(vec![self.extensions.to_value(&encoder)?]),
            ]));
        }
        Ok(Value::Sequence(vec![
            Value::Integer(0i64.into()),
            self.subject.to_value(&encoder)?,
            public_key.to_value(&encoder)?,
            Value::Tagged(Tagged::implicit(0, Value::Set(attributes))),
        ]))
    }

    /// Signs data with the request’s key.
    fn sign_data<S: Signer>(
        &self, signer: &S, key: &S::KeyId, data: &[u8]
    ) -> Result<Signature, Error> {
        let public_key = self.require_public_key()?;
        let info = signer.get_key_info(key).map_err(|err| {
            Error::SigningFailed(err.to_string())
        })?;
        if info != *public_key {
            return Err(Error::SigningFailed(
                "signing key does not match the public key".into()
            ))
        }
        let algorithm = signature_algorithm(public_key)?;
        signer.sign(key, algorithm, data).map_err(|err| {
            Error::SigningFailed(err.to_string())
        })
    }
}

fn signature_algorithm(
    public_key: &PublicKey
) -> Result<SignatureAlgorithm, Error> {
    match public_key.format() {
        Some(format) => Ok(SignatureAlgorithm::for_key_format(format)),
        None => {
            Err(Error::IncompleteRequest("unsupported public key algorithm"))
        }
    }
}

/// Wraps a signed value together with its signature.
fn signed_value(
    data: Value, signature: Signature, encoder: &Encoder
) -> Result<Value, Error> {
    let (algorithm, value) = signature.unwrap();
    Ok(Value::Sequence(vec![
        data,
        algorithm.identifier().to_value(encoder)?,
        Value::BitString(BitString::from_octets(value)),
    ]))
}

/// Creates a new positive serial number.
///
/// The number is derived from the current time in nanoseconds with a
/// counter mixed in, so that consecutive calls never collide.
fn fresh_serial_number() -> Integer {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|dur| {
        dur.as_nanos()
    }).unwrap_or(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    Integer::from(
        std::cmp::max((nanos << 16) | u128::from(count & 0xFFFF), 1)
    )
}


//------------ RequestState --------------------------------------------------

/// The life cycle of a certificate request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RequestState {
    /// Nothing has been set yet.
    Blank,

    /// Some values have been set.
    Populated,

    /// The request has been self-signed and is frozen.
    Signed,
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::cert::{CertificateInfo, GeneralNameType};
    use crate::crypto::{PublicKeyFormat, SoftSigner, Verifier};
    use crate::der::{decode, Decoder};

    fn signer_and_key() -> (SoftSigner, crate::crypto::softsigner::KeyId) {
        let signer = SoftSigner::new();
        let key = signer.create_key(PublicKeyFormat::EcdsaP256).unwrap();
        (signer, key)
    }

    #[test]
    fn self_sign() {
        let (signer, key) = signer_and_key();
        let public_key = signer.get_key_info(&key).unwrap();
        let mut req = CertificateRequest::new(&public_key);
        assert_eq!(req.state(), RequestState::Blank);
        req.subject_mut().set_common_name("Test").unwrap();
        assert_eq!(req.state(), RequestState::Populated);

        let cert = req.self_sign_with_private_key(&signer, &key).unwrap();
        assert_eq!(req.state(), RequestState::Signed);
        let cert = CertificateInfo::decode(cert).unwrap();
        let days = (
            cert.valid_to().to_datetime() - cert.valid_from().to_datetime()
        ).num_days();
        assert!((364..=366).contains(&days));
        assert_eq!(cert.issuer().common_name(), Some("Test"));
        assert_eq!(cert.subject().common_name(), Some("Test"));
        assert!(cert.is_root());
        assert!(!cert.serial_number().is_negative());
        assert!(!cert.serial_number().is_zero());
        assert!(cert.verify_signature_with_key(&public_key));
        cert.verify_self_signed().unwrap();

        let other = signer.create_key(PublicKeyFormat::EcdsaP256).unwrap();
        let other = signer.get_key_info(&other).unwrap();
        assert!(!cert.verify_signature_with_key(&other));

        // No extensions were set, so everything is allowed.
        assert_eq!(cert.key_usage(), KeyUsage::UNSPECIFIED);
        assert!(cert.allows_key_usage(KeyUsage::KEY_CERT_SIGN));
        assert!(cert.extension_oids().next().is_none());
    }

    #[test]
    fn frozen_after_signing() {
        let (signer, key) = signer_and_key();
        let public_key = signer.get_key_info(&key).unwrap();
        let mut req = CertificateRequest::new(&public_key);
        req.self_sign_with_private_key(&signer, &key).unwrap();

        assert_eq!(
            req.set_valid_to(Time::years_from_now(1).unwrap()),
            Err(Error::RequestAlreadySigned)
        );
        assert_eq!(
            req.subject_mut().set_common_name("Late"),
            Err(Error::RequestAlreadySigned)
        );
        assert_eq!(
            req.set_key_usage(KeyUsage::DIGITAL_SIGNATURE),
            Err(Error::RequestAlreadySigned)
        );
        assert_eq!(req.request_data(), Err(Error::RequestAlreadySigned));
        assert_eq!(
            req.self_sign_with_private_key(&signer, &key),
            Err(Error::RequestAlreadySigned)
        );
        assert!(req.valid_from().is_some());
    }

    #[test]
    fn incomplete_request() {
        let (signer, key) = signer_and_key();
        let mut req = CertificateRequest::blank();
        assert!(matches!(
            req.request_data(), Err(Error::IncompleteRequest(_))
        ));
        assert!(matches!(
            req.self_sign_with_private_key(&signer, &key),
            Err(Error::IncompleteRequest(_))
        ));
        assert_eq!(req.state(), RequestState::Blank);

        let public_key = signer.get_key_info(&key).unwrap();
        req.set_public_key(&public_key).unwrap();
        req.set_valid_from(Time::utc(2030, 1, 1, 0, 0, 0)).unwrap();
        req.set_valid_to(Time::utc(2029, 1, 1, 0, 0, 0)).unwrap();
        assert!(matches!(
            req.self_sign_with_private_key(&signer, &key),
            Err(Error::IncompleteRequest(_))
        ));
        assert_eq!(req.state(), RequestState::Populated);
    }

    #[test]
    fn default_validity_out_of_range() {
        let (signer, key) = signer_and_key();
        let public_key = signer.get_key_info(&key).unwrap();
        let mut req = CertificateRequest::new(&public_key);
        req.set_valid_from(
            Time::new(chrono::DateTime::<chrono::Utc>::MAX_UTC)
        ).unwrap();
        assert!(matches!(
            req.self_sign_with_private_key(&signer, &key),
            Err(Error::IncompleteRequest(_))
        ));

        req.set_valid_to(
            Time::new(chrono::DateTime::<chrono::Utc>::MAX_UTC)
        ).unwrap();
        assert!(matches!(
            req.self_sign_with_private_key(&signer, &key),
            Err(Error::UnencodableValue(_))
        ));
        assert_ne!(req.state(), RequestState::Signed);
    }

    #[test]
    fn wrong_signing_key() {
        let (signer, key) = signer_and_key();
        let other = signer.create_key(PublicKeyFormat::EcdsaP256).unwrap();
        let public_key = signer.get_key_info(&key).unwrap();
        let mut req = CertificateRequest::new(&public_key);
        assert!(matches!(
            req.self_sign_with_private_key(&signer, &other),
            Err(Error::SigningFailed(_))
        ));
        assert_eq!(req.state(), RequestState::Blank);
        req.self_sign_with_private_key(&signer, &key).unwrap();
    }

    #[test]
    fn extensions_and_validity() {
        let (signer, key) = signer_and_key();
        let public_key = signer.get_key_info(&key).unwrap();
        let mut req = CertificateRequest::new(&public_key);
        req.subject_mut().set_common_name("Test CA").unwrap();
        req.subject_mut().set_email_address("ca@example.com").unwrap();
        req.set_valid_from(Time::utc(2020, 1, 1, 0, 0, 0)).unwrap();
        req.set_valid_to(Time::utc(2060, 1, 1, 0, 0, 0)).unwrap();
        req.set_key_usage(
            KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN
        ).unwrap();
        req.set_extended_key_usage(vec![oid::KP_SERVER_AUTH]).unwrap();
        req.set_basic_constraints(
            BasicConstraints::new(true, Some(0))
        ).unwrap();
        req.set_subject_alternative_names(vec![
            GeneralName::Dns("ca.example.com".into()),
            GeneralName::Rfc822("other@example.com".into()),
        ]).unwrap();
        req.set_subject_key_identifier().unwrap();

        let cert = req.self_sign_with_private_key(&signer, &key).unwrap();
        let cert = CertificateInfo::decode(cert).unwrap();
        assert_eq!(cert.valid_from(), Time::utc(2020, 1, 1, 0, 0, 0));
        assert_eq!(cert.valid_to(), Time::utc(2060, 1, 1, 0, 0, 0));
        assert!(cert.is_certificate_authority());
        assert!(cert.allows_key_usage(KeyUsage::KEY_CERT_SIGN));
        assert!(!cert.allows_key_usage(KeyUsage::DIGITAL_SIGNATURE));
        assert_eq!(cert.extended_key_usage().len(), 1);
        assert_eq!(
            cert.subject_alternative_name()[&GeneralNameType::Dns].as_str(),
            Some("ca.example.com")
        );
        assert_eq!(
            cert.email_addresses(),
            vec![
                String::from("ca@example.com"),
                String::from("other@example.com"),
            ]
        );
        let (ski, critical) = cert.extension_for(
            &oid::CE_SUBJECT_KEY_IDENTIFIER
        ).unwrap();
        assert!(!critical);
        assert_eq!(
            ski.as_octet_string().unwrap().as_ref(),
            public_key.key_identifier().as_slice()
        );
        cert.verify_self_signed().unwrap();
    }

    #[test]
    fn request_data() {
        let (signer, key) = signer_and_key();
        let public_key = signer.get_key_info(&key).unwrap();
        let mut req = CertificateRequest::new(&public_key);
        req.subject_mut().set_common_name("Test").unwrap();
        req.set_force_printable_strings(true).unwrap();

        let data = req.request_data().unwrap();
        assert_eq!(req.request_data().unwrap(), data);
        let info = decode(data.clone()).unwrap();
        let items = info.as_sequence().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items[0].as_integer().unwrap().is_zero());
        assert_eq!(PublicKey::from_value(&items[2]).unwrap(), public_key);
        assert!(items[3].as_context(0).is_some());
        // CN=Test as PrintableString.
        assert!(data.windows(6).any(|w| w == b"\x13\x04Test"));

        req.set_key_usage(KeyUsage::DIGITAL_SIGNATURE).unwrap();
        let info = decode(req.request_data().unwrap()).unwrap();
        let attrs = info.as_sequence().unwrap()[3].as_context(0).unwrap();
        let attr = attrs.elements()[0].as_sequence().unwrap();
        assert_eq!(
            attr[0].as_oid().unwrap(), &oid::PKCS9_EXTENSION_REQUEST
        );
        assert_eq!(req.state(), RequestState::Populated);
    }

    #[test]
    fn signed_request_data() {
        let (signer, key) = signer_and_key();
        let public_key = signer.get_key_info(&key).unwrap();
        let mut req = CertificateRequest::new(&public_key);
        req.subject_mut().set_common_name("Test").unwrap();
        let data = req.signed_request_data(&signer, &key).unwrap();

        let mut outer = Decoder::new(data);
        let mut csr = outer.take_sequence().unwrap();
        outer.finish().unwrap();
        let info = csr.take_raw().unwrap();
        assert_eq!(info, req.request_data().unwrap());
        let _ = csr.take_value().unwrap();
        let bits = match csr.take_value().unwrap() {
            Value::BitString(bits) => bits,
            _ => panic!("not a bit string")
        };
        let signature = Signature::new(
            SignatureAlgorithm::EcdsaP256Sha256, bits.octets().clone()
        );
        public_key.verify(&info, &signature).unwrap();
        assert_ne!(req.state(), RequestState::Signed);
    }

    #[test]
    fn fresh_serials() {
        assert_ne!(fresh_serial_number(), fresh_serial_number());
    }
}
