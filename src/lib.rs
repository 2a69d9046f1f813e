//! DER encoding and X.509 certificates.
//!
//! This crate contains a codec for the Distinguished Encoding Rules of
//! ASN.1 in the [`der`] module and builds a model of X.509 certificates
//! on top of it.
//!
//! Certificates are parsed into a [`CertificateInfo`] which provides
//! access to the names, validity, public key, and extensions of the
//! certificate and checks its signature. New self-signed certificates and
//! PKCS #10 certification requests are made through a
//! [`CertificateRequest`].
//!
//! The crate never touches private keys itself. Signing happens through
//! the [`Signer`][crypto::Signer] trait. An implementation keeping keys in
//! memory is available as [`SoftSigner`][crypto::SoftSigner] and, with the
//! `softkeys` feature, one based on OpenSSL.
//!
//! [`CertificateInfo`]: cert::CertificateInfo
//! [`CertificateRequest`]: cert::CertificateRequest

pub use self::cert::{CertificateInfo, CertificateRequest};
pub use self::error::Error;
pub use self::oid::Oid;

pub mod cert;
pub mod crypto;
pub mod der;
pub mod error;
pub mod oid;
pub mod pem;
pub mod x509;

mod util;
