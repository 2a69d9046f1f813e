//! A signer keeping its keys in memory.
//!
//! The keys are generated and used through *ring*. This signer is meant
//! for self-signed certificates and tests, not for keys that need to be
//! kept safe.

use std::io;
use std::sync::{Arc, RwLock};
use bytes::Bytes;
use ring::rand;
use ring::signature::{
    self as ring_sig, EcdsaKeyPair, Ed25519KeyPair, KeyPair as _, RsaKeyPair,
};
use super::keys::{PublicKey, PublicKeyFormat};
use super::signature::{Signature, SignatureAlgorithm};
use super::signer::{KeyError, Signer, SigningError};


//------------ SoftSigner ----------------------------------------------------

/// A *ring* based signer.
///
/// New keys can be ECDSA P-256 or Ed25519 keys. RSA keys can’t be
/// generated but can be imported from PKCS #8.
pub struct SoftSigner {
    keys: RwLock<Vec<Option<Arc<KeyPair>>>>,
    rng: rand::SystemRandom,
}

impl SoftSigner {
    pub fn new() -> SoftSigner {
        SoftSigner {
            keys: Default::default(),
            rng: rand::SystemRandom::new(),
        }
    }

    /// Imports a private key from its PKCS #8 DER encoding.
    pub fn key_from_pkcs8(&self, der: &[u8]) -> Result<KeyId, io::Error> {
        let key = KeyPair::from_pkcs8(der, &self.rng)?;
        self.insert_key(key)
    }

    fn insert_key(&self, key: KeyPair) -> Result<KeyId, io::Error> {
        let mut keys = self.keys.write().map_err(|_| poisoned())?;
        let res = keys.len();
        keys.push(Some(key.into()));
        Ok(KeyId(res))
    }

    fn get_key(&self, id: KeyId) -> Result<Arc<KeyPair>, KeyError<io::Error>> {
        self.keys.read().map_err(|_| poisoned())?.get(id.0).and_then(|key| {
            key.as_ref().cloned()
        }).ok_or(KeyError::KeyNotFound)
    }

    fn delete_key(&self, key: KeyId) -> Result<(), KeyError<io::Error>> {
        let mut keys = self.keys.write().map_err(|_| poisoned())?;
        match keys.get_mut(key.0) {
            Some(key) => {
                if key.is_some() {
                    *key = None;
                    Ok(())
                }
                else {
                    Err(KeyError::KeyNotFound)
                }
            }
            None => Err(KeyError::KeyNotFound)
        }
    }
}

impl Signer for SoftSigner {
    type KeyId = KeyId;
    type Error = io::Error;

    fn create_key(
        &self, algorithm: PublicKeyFormat
    ) -> Result<Self::KeyId, Self::Error> {
        self.insert_key(KeyPair::new(algorithm, &self.rng)?)
    }

    fn get_key_info(
        &self,
        id: &Self::KeyId
    ) -> Result<PublicKey, KeyError<Self::Error>> {
        Ok(self.get_key(*id)?.get_key_info())
    }

    fn destroy_key(
        &self, key: &Self::KeyId
    ) -> Result<(), KeyError<Self::Error>> {
        self.delete_key(*key)
    }

    fn sign<D: AsRef<[u8]> + ?Sized>(
        &self,
        key: &Self::KeyId,
        algorithm: SignatureAlgorithm,
        data: &D
    ) -> Result<Signature, SigningError<Self::Error>> {
        self.get_key(*key)?.sign(algorithm, data.as_ref(), &self.rng)
    }
}


impl Default for SoftSigner {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "key table poisoned")
}

fn ring_error(_: ring::error::Unspecified) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "crypto operation failed")
}


//------------ KeyId ---------------------------------------------------------

/// This signer’s key identifier.
//
//  We wrap this in a newtype so that people won’t start mucking about with
//  the integers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct KeyId(usize);


//------------ KeyPair -------------------------------------------------------

/// A key pair kept by the signer.
enum KeyPair {
    Rsa(RsaKeyPair),
    Ecdsa(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
}

impl KeyPair {
    fn new(
        algorithm: PublicKeyFormat, rng: &rand::SystemRandom
    ) -> Result<Self, io::Error> {
        match algorithm {
            PublicKeyFormat::Rsa => {
                Err(io::Error::new(
                    io::ErrorKind::Other,
                    "RSA key generation not supported"
                ))
            }
            PublicKeyFormat::EcdsaP256 => {
                let alg = &ring_sig::ECDSA_P256_SHA256_ASN1_SIGNING;
                let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, rng)
                    .map_err(ring_error)?;
                EcdsaKeyPair::from_pkcs8(alg, pkcs8.as_ref(), rng).map(
                    KeyPair::Ecdsa
                ).map_err(|err| {
                    io::Error::new(io::ErrorKind::Other, err.to_string())
                })
            }
            PublicKeyFormat::Ed25519 => {
                let pkcs8 = Ed25519KeyPair::generate_pkcs8(rng)
                    .map_err(ring_error)?;
                Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map(
                    KeyPair::Ed25519
                ).map_err(|err| {
                    io::Error::new(io::ErrorKind::Other, err.to_string())
                })
            }
        }
    }

    fn from_pkcs8(
        der: &[u8], rng: &rand::SystemRandom
    ) -> Result<Self, io::Error> {
        if let Ok(key) = EcdsaKeyPair::from_pkcs8(
            &ring_sig::ECDSA_P256_SHA256_ASN1_SIGNING, der, rng
        ) {
            return Ok(KeyPair::Ecdsa(key))
        }
        if let Ok(key) = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der) {
            return Ok(KeyPair::Ed25519(key))
        }
        RsaKeyPair::from_pkcs8(der).map(KeyPair::Rsa).map_err(|err| {
            io::Error::new(io::ErrorKind::InvalidData, err.to_string())
        })
    }

    fn format(&self) -> PublicKeyFormat {
        match *self {
            KeyPair::Rsa(_) => PublicKeyFormat::Rsa,
            KeyPair::Ecdsa(_) => PublicKeyFormat::EcdsaP256,
            KeyPair::Ed25519(_) => PublicKeyFormat::Ed25519,
        }
    }

    fn get_key_info(&self) -> PublicKey {
        let bits = match *self {
            KeyPair::Rsa(ref key) => {
                Bytes::copy_from_slice(key.public_key().as_ref())
            }
            KeyPair::Ecdsa(ref key) => {
                Bytes::copy_from_slice(key.public_key().as_ref())
            }
            KeyPair::Ed25519(ref key) => {
                Bytes::copy_from_slice(key.public_key().as_ref())
            }
        };
        PublicKey::new(self.format(), bits)
    }

    fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        rng: &rand::SystemRandom,
    ) -> Result<Signature, SigningError<io::Error>> {
        if !algorithm.can_sign() || algorithm.public_key_format() != self.format() {
            return Err(SigningError::IncompatibleKey)
        }
        let value = match *self {
            KeyPair::Rsa(ref key) => {
                let mut res = vec![0u8; key.public().modulus_len()];
                key.sign(&ring_sig::RSA_PKCS1_SHA256, rng, data, &mut res)
                    .map_err(ring_error)?;
                Bytes::from(res)
            }
            KeyPair::Ecdsa(ref key) => {
                let res = key.sign(rng, data).map_err(ring_error)?;
                Bytes::copy_from_slice(res.as_ref())
            }
            KeyPair::Ed25519(ref key) => {
                Bytes::copy_from_slice(key.sign(data).as_ref())
            }
        };
        Ok(Signature::new(algorithm, value))
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::crypto::signer::Verifier;

    #[test]
    fn info_sign_delete() {
        let s = SoftSigner::new();
        let ki = s.create_key(PublicKeyFormat::EcdsaP256).unwrap();
        let data = b"foobar";
        let info = s.get_key_info(&ki).unwrap();
        assert_eq!(info.format(), Some(PublicKeyFormat::EcdsaP256));
        let sig = s.sign(
            &ki, SignatureAlgorithm::EcdsaP256Sha256, data
        ).unwrap();
        info.verify(data, &sig).unwrap();
        assert!(info.verify(b"barfoo", &sig).is_err());
        s.destroy_key(&ki).unwrap();
        assert!(matches!(
            s.get_key_info(&ki), Err(KeyError::KeyNotFound)
        ));
        assert!(s.destroy_key(&ki).is_err());
    }

    #[test]
    fn ed25519() {
        let s = SoftSigner::new();
        let ki = s.create_key(PublicKeyFormat::Ed25519).unwrap();
        let info = s.get_key_info(&ki).unwrap();
        assert_eq!(info.bits().len(), 32);
        let sig = s.sign(&ki, SignatureAlgorithm::Ed25519, b"foobar").unwrap();
        info.verify(b"foobar", &sig).unwrap();
    }

    #[test]
    fn incompatible_algorithm() {
        let s = SoftSigner::new();
        let ki = s.create_key(PublicKeyFormat::Ed25519).unwrap();
        assert!(matches!(
            s.sign(&ki, SignatureAlgorithm::EcdsaP256Sha256, b"foobar"),
            Err(SigningError::IncompatibleKey)
        ));
        assert!(s.create_key(PublicKeyFormat::Rsa).is_err());
    }
}
