//! The error type of the crate.

use std::{error, fmt};
use crate::der::{DecodeError, EncodeError};
use crate::oid::OidError;


//------------ Error ---------------------------------------------------------

/// Something went wrong with a certificate or certificate request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The input is not valid DER.
    MalformedInput(DecodeError),

    /// A value of a different type was found than was expected.
    TypeMismatch(DecodeError),

    /// The input is valid DER but not a valid certificate.
    MalformedCertificate(&'static str),

    /// An object identifier couldn’t be parsed.
    MalformedIdentifier(OidError),

    /// The PEM armour around the data is broken.
    MalformedPem(&'static str),

    /// A name was changed that isn’t owned by a certificate request.
    ImmutableName,

    /// A certificate request was changed after it was signed.
    RequestAlreadySigned,

    /// A certificate request lacks a required component.
    IncompleteRequest(&'static str),

    /// A value cannot be represented in DER.
    UnencodableValue(EncodeError),

    /// The signer failed to produce a signature.
    SigningFailed(String),

    /// A signature did not verify.
    VerificationFailed,
}

impl Error {
    /// Returns whether this error was caused by broken input data.
    pub fn is_malformed(&self) -> bool {
        matches!(
            *self,
            Error::MalformedInput(_) | Error::TypeMismatch(_)
            | Error::MalformedCertificate(_) | Error::MalformedPem(_)
        )
    }
}


//--- From

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        if err.is_type_mismatch() {
            Error::TypeMismatch(err)
        }
        else {
            Error::MalformedInput(err)
        }
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::UnencodableValue(err)
    }
}

impl From<OidError> for Error {
    fn from(err: OidError) -> Self {
        Error::MalformedIdentifier(err)
    }
}


//--- Display and Error

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::MalformedInput(ref err) => {
                write!(f, "malformed input: {}", err)
            }
            Error::TypeMismatch(ref err) => {
                write!(f, "type mismatch: {}", err)
            }
            Error::MalformedCertificate(msg) => {
                write!(f, "malformed certificate: {}", msg)
            }
            Error::MalformedIdentifier(ref err) => {
                write!(f, "malformed object identifier: {}", err)
            }
            Error::MalformedPem(msg) => write!(f, "malformed PEM: {}", msg),
            Error::ImmutableName => f.write_str("name is immutable"),
            Error::RequestAlreadySigned => {
                f.write_str("certificate request has already been signed")
            }
            Error::IncompleteRequest(msg) => {
                write!(f, "incomplete certificate request: {}", msg)
            }
            Error::UnencodableValue(ref err) => {
                write!(f, "cannot encode value: {}", err)
            }
            Error::SigningFailed(ref msg) => {
                write!(f, "signing failed: {}", msg)
            }
            Error::VerificationFailed => {
                f.write_str("signature verification failed")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::MalformedInput(ref err) => Some(err),
            Error::TypeMismatch(ref err) => Some(err),
            Error::MalformedIdentifier(ref err) => Some(err),
            Error::UnencodableValue(ref err) => Some(err),
            _ => None
        }
    }
}


//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::der::{decode, Tag};

    #[test]
    fn from_decode_error() {
        let err = Error::from(decode(&b"\x04\x05ab"[..]).unwrap_err());
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.is_malformed());

        let err = Error::from(
            crate::der::Decoder::new(&b"\x05\x00"[..])
                .take_value_if(Tag::INTEGER).unwrap_err()
        );
        assert!(matches!(err, Error::TypeMismatch(_)));
        assert!(!Error::RequestAlreadySigned.is_malformed());
    }
}
