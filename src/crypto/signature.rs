//! Signature algorithms and operations.

use std::fmt;
use bytes::Bytes;
use crate::oid;
use crate::der::Value;
use crate::x509::AlgorithmIdentifier;
use super::keys::PublicKeyFormat;


//------------ SignatureAlgorithm --------------------------------------------

/// The signature algorithms understood by this crate.
///
/// # ASN.1 Values
///
/// In certificates and certification requests, signature algorithms are
/// given through an algorithm identifier:
///
/// ```txt
/// AlgorithmIdentifier          ::= SEQUENCE {
///      algorithm                   OBJECT IDENTIFIER,
///      parameters                  ANY DEFINED BY algorithm OPTIONAL }
/// ```
///
/// The RSA algorithms from [RFC 4055] have a parameters field that should
/// be NULL but may also be missing. The ECDSA algorithm from [RFC 5758] and
/// Ed25519 from [RFC 8410] must not have parameters. When constructing
/// identifiers, RSA algorithms always get the NULL parameters.
///
/// [RFC 4055]: https://tools.ietf.org/html/rfc4055
/// [RFC 5758]: https://tools.ietf.org/html/rfc5758
/// [RFC 8410]: https://tools.ietf.org/html/rfc8410
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// RSA PKCS #1 v1.5 with SHA-1.
    ///
    /// This is only supported for verifying old certificates.
    RsaPkcs1Sha1,

    /// RSA PKCS #1 v1.5 with SHA-256.
    RsaPkcs1Sha256,

    /// ECDSA on the P-256 curve with SHA-256.
    EcdsaP256Sha256,

    /// Ed25519.
    Ed25519,
}

impl SignatureAlgorithm {
    /// Determines the algorithm from an algorithm identifier.
    ///
    /// Returns `None` if the algorithm isn’t supported.
    pub fn from_identifier(alg: &AlgorithmIdentifier) -> Option<Self> {
        let rsa_params = matches!(alg.parameters(), None | Some(Value::Null));
        if *alg.oid() == oid::SHA256_WITH_RSA_ENCRYPTION && rsa_params {
            Some(SignatureAlgorithm::RsaPkcs1Sha256)
        }
        else if *alg.oid() == oid::SHA1_WITH_RSA_ENCRYPTION && rsa_params {
            Some(SignatureAlgorithm::RsaPkcs1Sha1)
        }
        else if alg.parameters().is_some() {
            None
        }
        else if *alg.oid() == oid::ECDSA_WITH_SHA256 {
            Some(SignatureAlgorithm::EcdsaP256Sha256)
        }
        else if *alg.oid() == oid::ED25519 {
            Some(SignatureAlgorithm::Ed25519)
        }
        else {
            None
        }
    }

    /// Returns the algorithm identifier for this algorithm.
    pub fn identifier(self) -> AlgorithmIdentifier {
        match self {
            SignatureAlgorithm::RsaPkcs1Sha1 => {
                AlgorithmIdentifier::new(
                    oid::SHA1_WITH_RSA_ENCRYPTION, Some(Value::Null)
                )
            }
            SignatureAlgorithm::RsaPkcs1Sha256 => {
                AlgorithmIdentifier::new(
                    oid::SHA256_WITH_RSA_ENCRYPTION, Some(Value::Null)
                )
            }
            SignatureAlgorithm::EcdsaP256Sha256 => {
                AlgorithmIdentifier::new(oid::ECDSA_WITH_SHA256, None)
            }
            SignatureAlgorithm::Ed25519 => {
                AlgorithmIdentifier::new(oid::ED25519, None)
            }
        }
    }

    /// Returns the public key format needed for the algorithm.
    pub fn public_key_format(self) -> PublicKeyFormat {
        match self {
            SignatureAlgorithm::RsaPkcs1Sha1
            | SignatureAlgorithm::RsaPkcs1Sha256 => PublicKeyFormat::Rsa,
            SignatureAlgorithm::EcdsaP256Sha256 => PublicKeyFormat::EcdsaP256,
            SignatureAlgorithm::Ed25519 => PublicKeyFormat::Ed25519,
        }
    }

    /// Returns the algorithm used for new signatures with a key format.
    pub fn for_key_format(format: PublicKeyFormat) -> Self {
        match format {
            PublicKeyFormat::Rsa => SignatureAlgorithm::RsaPkcs1Sha256,
            PublicKeyFormat::EcdsaP256 => SignatureAlgorithm::EcdsaP256Sha256,
            PublicKeyFormat::Ed25519 => SignatureAlgorithm::Ed25519,
        }
    }

    /// Returns whether new signatures may be made with this algorithm.
    pub fn can_sign(self) -> bool {
        !matches!(self, SignatureAlgorithm::RsaPkcs1Sha1)
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            SignatureAlgorithm::RsaPkcs1Sha1 => "sha1WithRSAEncryption",
            SignatureAlgorithm::RsaPkcs1Sha256 => "sha256WithRSAEncryption",
            SignatureAlgorithm::EcdsaP256Sha256 => "ecdsa-with-SHA256",
            SignatureAlgorithm::Ed25519 => "Ed25519",
        })
    }
}


//------------ Signature -----------------------------------------------------

/// A signature together with the algorithm it was made with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    algorithm: SignatureAlgorithm,
    value: Bytes
}

impl Signature {
    pub fn new(algorithm: SignatureAlgorithm, value: Bytes) -> Self {
        Signature { algorithm, value }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn unwrap(self) -> (SignatureAlgorithm, Bytes) {
        (self.algorithm, self.value)
    }
}


//------------ Tests ---------------------------------------------------------
