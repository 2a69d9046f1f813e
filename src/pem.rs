//! PEM armour for DER encoded data.
//!
//! PEM is the Base 64 encoding of DER data wrapped into lines of at most
//! 64 characters between a `-----BEGIN <label>-----` and an
//! `-----END <label>-----` line. It is described in [RFC 7468].
//!
//! [RFC 7468]: https://tools.ietf.org/html/rfc7468

use std::fmt;
use bytes::Bytes;
use crate::error::Error;


//------------ Pem -----------------------------------------------------------

/// A single PEM block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pem {
    label: String,
    contents: Bytes,
}

impl Pem {
    pub const CERTIFICATE: &'static str = "CERTIFICATE";
    pub const CERTIFICATE_REQUEST: &'static str = "CERTIFICATE REQUEST";

    pub fn new(label: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Pem { label: label.into(), contents: contents.into() }
    }

    /// Parses the first PEM block found in `text`.
    ///
    /// Anything before the begin line is ignored, as are any headers in
    /// the block. The end line has to carry the same label as the begin
    /// line.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut lines = text.lines().map(str::trim);
        let label = loop {
            let line = match lines.next() {
                Some(line) => line,
                None => return Err(Error::MalformedPem("missing begin line"))
            };
            if let Some(label) = strip_armour(line, "-----BEGIN ") {
                break label
            }
        };
        let mut data = String::new();
        loop {
            let line = match lines.next() {
                Some(line) => line,
                None => return Err(Error::MalformedPem("missing end line"))
            };
            if let Some(end) = strip_armour(line, "-----END ") {
                if end != label {
                    return Err(Error::MalformedPem("label mismatch"))
                }
                break
            }
            if line.contains(':') {
                // Header line of the legacy format.
                continue
            }
            data.push_str(line);
        }
        let contents = base64::decode(&data).map_err(|_| {
            Error::MalformedPem("invalid Base 64 data")
        })?;
        Ok(Pem::new(label, contents))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contents(&self) -> &Bytes {
        &self.contents
    }

    pub fn into_contents(self) -> Bytes {
        self.contents
    }
}

fn strip_armour<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.starts_with(prefix) && line.ends_with("-----") {
        let end = line.len() - 5;
        if end >= prefix.len() {
            return Some(&line[prefix.len()..end])
        }
    }
    None
}


//--- Display

impl fmt::Display for Pem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "-----BEGIN {}-----", self.label)?;
        let data = base64::encode(&self.contents);
        let mut rest = data.as_str();
        while !rest.is_empty() {
            let (line, tail) = rest.split_at(std::cmp::min(64, rest.len()));
            writeln!(f, "{}", line)?;
            rest = tail;
        }
        writeln!(f, "-----END {}-----", self.label)
    }
}


//------------ Tests ---------------------------------------------------------
