//! Types and parameters of keys.

use std::{error, fmt, str};
use std::str::FromStr;
use bytes::Bytes;
use ring::{digest, signature};
use ring::error::Unspecified;
use crate::oid;
use crate::der::{BitString, Encode, EncodeError, Encoder, Value};
use crate::error::Error;
use crate::util::hex;
use crate::x509::AlgorithmIdentifier;
use super::signature::{Signature, SignatureAlgorithm};
use super::signer::Verifier;


//------------ PublicKeyFormat -----------------------------------------------

/// The formats of public keys supported for signing and verification.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PublicKeyFormat {
    /// An RSA public key.
    Rsa,

    /// An ECDSA public key for the P-256 elliptic curve.
    EcdsaP256,

    /// An Ed25519 public key.
    Ed25519,
}

/// # ASN.1 Algorithm Identifiers
///
/// The format of the public key is identified in certificates through a
/// algorithm identifier.
///
/// For RSA keys, the object identifier needs to be that of `rsaEncryption`
/// defined by [RFC 4055] and the parameters must be present and NULL.
/// When parsing, we generously also allow it to be absent altogether.
///
/// For ECDSA keys, the object identifer needs to be `ecPublicKey` defined
/// in [RFC 5480] with the parameter being the object identifier `secp256r1`
/// defined in the same RFC.
///
/// Ed25519 keys are identified by `id-Ed25519` from [RFC 8410] without
/// parameters.
///
/// [RFC 4055]: https://tools.ietf.org/html/rfc4055
/// [RFC 5480]: https://tools.ietf.org/html/rfc5480
/// [RFC 8410]: https://tools.ietf.org/html/rfc8410
impl PublicKeyFormat {
    /// Determines the format from an algorithm identifier.
    ///
    /// Returns `None` if the algorithm isn’t one of the supported ones.
    pub fn from_identifier(alg: &AlgorithmIdentifier) -> Option<Self> {
        if *alg.oid() == oid::RSA_ENCRYPTION {
            match alg.parameters() {
                None | Some(Value::Null) => Some(PublicKeyFormat::Rsa),
                _ => None
            }
        }
        else if *alg.oid() == oid::EC_PUBLIC_KEY {
            match alg.parameters().and_then(Value::as_oid) {
                Some(curve) if *curve == oid::SECP256R1 => {
                    Some(PublicKeyFormat::EcdsaP256)
                }
                _ => None
            }
        }
        else if *alg.oid() == oid::ED25519 {
            if alg.parameters().is_none() {
                Some(PublicKeyFormat::Ed25519)
            }
            else {
                None
            }
        }
        else {
            None
        }
    }

    /// Returns the algorithm identifier for the format.
    pub fn identifier(self) -> AlgorithmIdentifier {
        match self {
            PublicKeyFormat::Rsa => {
                AlgorithmIdentifier::new(
                    oid::RSA_ENCRYPTION, Some(Value::Null)
                )
            }
            PublicKeyFormat::EcdsaP256 => {
                AlgorithmIdentifier::new(
                    oid::EC_PUBLIC_KEY,
                    Some(Value::Oid(oid::SECP256R1.to_oid()))
                )
            }
            PublicKeyFormat::Ed25519 => {
                AlgorithmIdentifier::new(oid::ED25519, None)
            }
        }
    }
}

impl fmt::Display for PublicKeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            PublicKeyFormat::Rsa => "RSA",
            PublicKeyFormat::EcdsaP256 => "ECDSA P-256",
            PublicKeyFormat::Ed25519 => "Ed25519",
        })
    }
}


//------------ PublicKey -----------------------------------------------------

/// A public key.
///
/// This is the content of a `SubjectPublicKeyInfo`. Keys of any algorithm
/// can be represented, but only those with a known [`PublicKeyFormat`] can
/// be used to verify signatures.
///
/// ```text
/// SubjectPublicKeyInfo  ::=  SEQUENCE  {
///      algorithm            AlgorithmIdentifier,
///      subjectPublicKey     BIT STRING  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    algorithm: AlgorithmIdentifier,
    bits: BitString,
}

impl PublicKey {
    /// Creates a public key of a known format from the key bits.
    pub fn new(format: PublicKeyFormat, bits: impl Into<Bytes>) -> Self {
        PublicKey {
            algorithm: format.identifier(),
            bits: BitString::from_octets(bits),
        }
    }

    /// Returns the algorithm identifier of this public key.
    pub fn algorithm(&self) -> &AlgorithmIdentifier {
        &self.algorithm
    }

    /// Returns the format of the key if it is supported.
    pub fn format(&self) -> Option<PublicKeyFormat> {
        PublicKeyFormat::from_identifier(&self.algorithm)
    }

    /// Returns the bits of this public key.
    pub fn bits(&self) -> &[u8] {
        self.bits.octet_slice()
    }

    /// Returns a key identifier for this key.
    ///
    /// The identifier will be the SHA1 hash of the key’s bits.
    pub fn key_identifier(&self) -> KeyIdentifier {
        let digest = digest::digest(
            &digest::SHA1_FOR_LEGACY_USE_ONLY, self.bits()
        );
        let mut res = KeyIdentifier([0; 20]);
        res.0.copy_from_slice(digest.as_ref());
        res
    }
}


/// # As `SubjectPublicKeyInfo`
impl PublicKey {
    /// Decodes a DER encoded `SubjectPublicKeyInfo`.
    pub fn decode(data: impl Into<Bytes>) -> Result<Self, Error> {
        Self::from_value(&crate::der::decode(data)?)
    }

    pub fn from_value(value: &Value) -> Result<Self, Error> {
        match value.as_sequence() {
            Some([algorithm, Value::BitString(bits)]) => {
                Ok(PublicKey {
                    algorithm: AlgorithmIdentifier::from_value(algorithm)?,
                    bits: bits.clone(),
                })
            }
            _ => {
                Err(Error::MalformedCertificate(
                    "invalid subject public key info"
                ))
            }
        }
    }

    /// Returns the DER encoded `SubjectPublicKeyInfo`.
    pub fn to_info_bytes(&self) -> Result<Bytes, EncodeError> {
        self.encode(&Encoder::new())
    }
}

impl Encode for PublicKey {
    fn to_value(&self, encoder: &Encoder) -> Result<Value, EncodeError> {
        Ok(Value::Sequence(vec![
            self.algorithm.to_value(encoder)?,
            Value::BitString(self.bits.clone()),
        ]))
    }
}


//--- Verifier

impl Verifier for PublicKey {
    /// Verifies a signature using this public key.
    ///
    /// The signature algorithm must match the format of the key. RSA keys
    /// need to have a modulus of at least 2048 bits.
    fn verify(
        &self, message: &[u8], signature: &Signature
    ) -> Result<(), SignatureVerificationError> {
        let format = match self.format() {
            Some(format) => format,
            None => return Err(SignatureVerificationError)
        };
        if format != signature.algorithm().public_key_format() {
            return Err(SignatureVerificationError)
        }
        let alg: &'static dyn signature::VerificationAlgorithm = {
            match signature.algorithm() {
                SignatureAlgorithm::RsaPkcs1Sha1 => {
                    &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY
                }
                SignatureAlgorithm::RsaPkcs1Sha256 => {
                    &signature::RSA_PKCS1_2048_8192_SHA256
                }
                SignatureAlgorithm::EcdsaP256Sha256 => {
                    &signature::ECDSA_P256_SHA256_ASN1
                }
                SignatureAlgorithm::Ed25519 => &signature::ED25519,
            }
        };
        signature::UnparsedPublicKey::new(alg, self.bits()).verify(
            message, signature.value().as_ref()
        ).map_err(Into::into)
    }
}


//------------ KeyIdentifier -------------------------------------------------

/// A key identifier.
///
/// This is the SHA-1 hash over the public key’s bits.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct KeyIdentifier([u8; 20]);

impl KeyIdentifier {
    /// Returns an octet slice of the key identifer’s value.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns a octet array with the hex representation of the identifier.
    pub fn into_hex(self) -> [u8; 40] {
        let mut res = [0u8; 40];
        hex::encode(self.as_slice(), &mut res);
        res
    }
}


//--- FromStr

impl FromStr for KeyIdentifier {
    type Err = RepresentationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let octets = hex::decode(value).ok_or(RepresentationError)?;
        if octets.len() != 20 {
            return Err(RepresentationError)
        }
        let mut res = KeyIdentifier([0; 20]);
        res.0.copy_from_slice(&octets);
        Ok(res)
    }
}


//--- AsRef

impl AsRef<[u8]> for KeyIdentifier {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}


//--- Display and Debug

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = [0u8; 40];
        write!(f, "{}", hex::encode(self.as_slice(), &mut buf))
    }
}

impl fmt::Debug for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "KeyIdentifier({})", self)
    }
}


//------------ RepresentationError -------------------------------------------

/// A key identifier was given in the wrong format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RepresentationError;

impl fmt::Display for RepresentationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("wrong representation")
    }
}

impl error::Error for RepresentationError { }


//------------ SignatureVerificationError ------------------------------------

/// An error happened while verifying a signature.
///
/// No further information is provided. This is on purpose.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SignatureVerificationError;

impl From<Unspecified> for SignatureVerificationError {
    fn from(_: Unspecified) -> Self {
        SignatureVerificationError
    }
}

impl From<SignatureVerificationError> for Error {
    fn from(_: SignatureVerificationError) -> Self {
        Error::VerificationFailed
    }
}

impl fmt::Display for SignatureVerificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("signature verification failed")
    }
}

impl error::Error for SignatureVerificationError { }


//------------ Tests ---------------------------------------------------------
