//! A signer atop the OpenSSL library.
//!
//! Because this adds a dependency to openssl libs this is disabled by
//! default and should only be used by applications that need RSA keys or
//! want to load keys from PEM files.

use std::io;
use std::sync::{Arc, RwLock};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Private};
use openssl::rsa::Rsa;
use super::keys::{PublicKey, PublicKeyFormat};
use super::signature::{Signature, SignatureAlgorithm};
use super::signer::{KeyError, Signer, SigningError};


//------------ OpenSslSigner -------------------------------------------------

/// An OpenSSL based signer.
///
/// Keeps the keys in memory.
pub struct OpenSslSigner {
    keys: RwLock<Vec<Option<Arc<KeyPair>>>>,
}

impl OpenSslSigner {
    pub fn new() -> OpenSslSigner {
        OpenSslSigner {
            keys: Default::default(),
        }
    }

    pub fn key_from_der(&self, der: &[u8]) -> Result<KeyId, io::Error> {
        self.insert_key(KeyPair::from_pkey(PKey::private_key_from_der(der)?)?)
    }

    pub fn key_from_pem(&self, pem: &[u8]) -> Result<KeyId, io::Error> {
        self.insert_key(KeyPair::from_pkey(PKey::private_key_from_pem(pem)?)?)
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

impl Signer for OpenSslSigner {
    type KeyId = KeyId;
    type Error = io::Error;

    fn create_key(
        &self, algorithm: PublicKeyFormat
    ) -> Result<Self::KeyId, Self::Error> {
        self.insert_key(KeyPair::new(algorithm)?)
    }

    fn get_key_info(
        &self,
        id: &Self::KeyId
    ) -> Result<PublicKey, KeyError<Self::Error>> {
        self.get_key(*id)?.get_key_info().map_err(KeyError::Signer)
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
        self.get_key(*key)?.sign(algorithm, data.as_ref())
    }

}


impl Default for OpenSslSigner {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "key table poisoned")
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
struct KeyPair {
    format: PublicKeyFormat,
    pkey: PKey<Private>,
}

impl KeyPair {
    fn new(algorithm: PublicKeyFormat) -> Result<Self, io::Error> {
        let pkey = match algorithm {
            PublicKeyFormat::Rsa => PKey::from_rsa(Rsa::generate(2048)?)?,
            PublicKeyFormat::EcdsaP256 => {
                let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
                PKey::from_ec_key(EcKey::generate(&group)?)?
            }
            PublicKeyFormat::Ed25519 => PKey::generate_ed25519()?,
        };
        Ok(KeyPair { format: algorithm, pkey })
    }

    fn from_pkey(pkey: PKey<Private>) -> Result<Self, io::Error> {
        let format = match pkey.id() {
            Id::RSA => {
                if pkey.bits() < 2048 {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("invalid key length {}", pkey.bits())
                    ))
                }
                PublicKeyFormat::Rsa
            }
            Id::EC => PublicKeyFormat::EcdsaP256,
            Id::ED25519 => PublicKeyFormat::Ed25519,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::Other, "unsupported key type"
                ))
            }
        };
        let res = KeyPair { format, pkey };
        if res.get_key_info()?.format() != Some(format) {
            return Err(io::Error::new(
                io::ErrorKind::Other, "unsupported key type"
            ))
        }
        Ok(res)
    }

    fn get_key_info(&self) -> Result<PublicKey, io::Error> {
        let der = self.pkey.public_key_to_der()?;
        PublicKey::decode(der).map_err(|err| {
            io::Error::new(io::ErrorKind::InvalidData, err.to_string())
        })
    }

    fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8]
    ) -> Result<Signature, SigningError<io::Error>> {
        if !algorithm.can_sign() || algorithm.public_key_format() != self.format {
            return Err(SigningError::IncompatibleKey)
        }
        let value = match self.format {
            PublicKeyFormat::Ed25519 => {
                let mut signer = ::openssl::sign::Signer::new_without_digest(
                    &self.pkey
                ).map_err(io::Error::from)?;
                signer.sign_oneshot_to_vec(data).map_err(io::Error::from)?
            }
            _ => {
                let mut signer = ::openssl::sign::Signer::new(
                    MessageDigest::sha256(), &self.pkey
                ).map_err(io::Error::from)?;
                signer.update(data).map_err(io::Error::from)?;
                signer.sign_to_vec().map_err(io::Error::from)?
            }
        };
        Ok(Signature::new(algorithm, value.into()))
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::crypto::signer::Verifier;

    #[test]
    fn info_sign_delete() {
        let s = OpenSslSigner::new();
        for &(format, alg) in &[
            (PublicKeyFormat::Rsa, SignatureAlgorithm::RsaPkcs1Sha256),
            (PublicKeyFormat::EcdsaP256, SignatureAlgorithm::EcdsaP256Sha256),
            (PublicKeyFormat::Ed25519, SignatureAlgorithm::Ed25519),
        ] {
            let ki = s.create_key(format).unwrap();
            let data = b"foobar";
            let info = s.get_key_info(&ki).unwrap();
            assert_eq!(info.format(), Some(format));
            let sig = s.sign(&ki, alg, data).unwrap();
            info.verify(data, &sig).unwrap();
            s.destroy_key(&ki).unwrap();
        }
    }
}
