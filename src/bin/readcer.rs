//! Prints the content of a certificate.
//!
//! The certificate can be DER or PEM encoded.

use std::{env, fs};
use std::io::Read;
use std::process::exit;
use dercert::cert::{CertificateInfo, KeyUsage};


fn main() {
    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            println!("Usage: readcer <path>");
            exit(2)
        }
    };
    let mut file = match fs::File::open(&path) {
        Ok(file) => file,
        Err(err) => {
            println!("Can’t open file: {}", err);
            exit(1)
        }
    };
    let mut data = Vec::new();
    if let Err(err) = file.read_to_end(&mut data) {
        println!("Can’t read file: {}", err);
        exit(1)
    }

    let cert = match std::str::from_utf8(&data) {
        Ok(text) if text.contains("-----BEGIN") => {
            CertificateInfo::from_pem(text)
        }
        _ => CertificateInfo::decode(data)
    };
    let cert = match cert {
        Ok(cert) => cert,
        Err(err) => {
            println!("Can’t decode cert: {}", err);
            exit(1)
        }
    };

    println!("Version:    {}", cert.version());
    println!("Serial:     {}", cert.serial_number());
    println!("Algorithm:  {}", cert.signature_algorithm().oid());
    println!("Issuer:     {}", cert.issuer());
    println!("Subject:    {}", cert.subject());
    println!("Not before: {}", cert.valid_from());
    println!("Not after:  {}", cert.valid_to());
    match cert.subject_public_key().format() {
        Some(format) => println!("Key:        {}", format),
        None => {
            println!(
                "Key:        {}", cert.subject_public_key().algorithm().oid()
            )
        }
    }
    println!("Key ID:     {}", cert.subject_public_key().key_identifier());
    if cert.is_root() {
        let status = match cert.verify_self_signed() {
            Ok(()) => "valid",
            Err(_) => "INVALID",
        };
        println!("Self-signed, signature {}", status);
    }
    if cert.is_certificate_authority() {
        println!("CA certificate");
    }
    let key_usage = cert.key_usage();
    if key_usage != KeyUsage::UNSPECIFIED {
        println!("Key usage:  {}", key_usage);
    }
    for purpose in cert.extended_key_usage() {
        println!("Purpose:    {}", purpose);
    }
    for name in cert.subject_alternative_names() {
        println!("Alt name:   {} {:?}", name.name_type(), name.to_san_value());
    }
    for ext in cert.extensions().iter() {
        println!(
            "Extension:  {}{}",
            ext.oid(), if ext.is_critical() { " (critical)" } else { "" }
        );
    }
}
