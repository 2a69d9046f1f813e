//! Signing related implementations.
//!
//! Private keys never appear in this crate’s API. Instead, signing happens
//! through the [`Signer`] trait which refers to keys by identifier only.
//! Signatures are checked through the [`Verifier`] trait which is
//! implemented by [`PublicKey`].

pub use self::keys::{
    KeyIdentifier, PublicKey, PublicKeyFormat, SignatureVerificationError,
};
pub use self::signer::{KeyError, Signer, SigningError, Verifier};
pub use self::signature::{Signature, SignatureAlgorithm};
pub use self::softsigner::SoftSigner;

pub mod keys;
pub mod signer;
pub mod signature;
pub mod softsigner;
#[cfg(feature = "softkeys")] pub mod opensslsigner;
