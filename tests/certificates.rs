//! Tests of the certificate model with real certificates.

use dercert::cert::{
    BasicConstraints, CertificateInfo, CertificateRequest, GeneralName,
    KeyUsage, RequestState,
};
use dercert::crypto::{PublicKeyFormat, Signer, SoftSigner};
use dercert::error::Error;
use dercert::oid;
use dercert::x509::Time;

const ROOT: &[u8] = include_bytes!("../test-data/root.der");
const LEAF: &[u8] = include_bytes!("../test-data/leaf.der");
const KU_CRITICAL: &[u8] = include_bytes!("../test-data/ku-critical.der");

#[test]
fn key_usage_policy() {
    // Critical, digitalSignature only.
    let cert = CertificateInfo::decode(KU_CRITICAL).unwrap();
    assert_eq!(cert.key_usage(), KeyUsage::DIGITAL_SIGNATURE);
    assert!(cert.allows_key_usage(KeyUsage::DIGITAL_SIGNATURE));
    assert!(!cert.allows_key_usage(
        KeyUsage::DIGITAL_SIGNATURE | KeyUsage::KEY_ENCIPHERMENT
    ));

    // Not critical, digitalSignature only.
    let cert = CertificateInfo::decode(LEAF).unwrap();
    assert_eq!(cert.key_usage(), KeyUsage::DIGITAL_SIGNATURE);
    assert!(cert.allows_key_usage(
        KeyUsage::KEY_ENCIPHERMENT | KeyUsage::DECIPHER_ONLY
    ));

    // Absent.
    let signer = SoftSigner::new();
    let key = signer.create_key(PublicKeyFormat::Ed25519).unwrap();
    let public_key = signer.get_key_info(&key).unwrap();
    let mut req = CertificateRequest::new(&public_key);
    req.subject_mut().set_common_name("No Usage").unwrap();
    let cert = CertificateInfo::decode(
        req.self_sign_with_private_key(&signer, &key).unwrap()
    ).unwrap();
    assert_eq!(cert.key_usage(), KeyUsage::UNSPECIFIED);
    assert!(cert.allows_key_usage(KeyUsage::UNSPECIFIED));
    assert!(cert.allows_key_usage(KeyUsage::CRL_SIGN));
}

#[test]
fn is_root() {
    assert!(CertificateInfo::decode(ROOT).unwrap().is_root());
    assert!(CertificateInfo::decode(KU_CRITICAL).unwrap().is_root());
    assert!(!CertificateInfo::decode(LEAF).unwrap().is_root());
}

#[test]
fn issuer_signature() {
    let root = CertificateInfo::decode(ROOT).unwrap();
    let leaf = CertificateInfo::decode(LEAF).unwrap();
    assert_eq!(leaf.issuer(), root.subject());
    assert!(leaf.verify_signature_with_key(root.subject_public_key()));
    assert!(!leaf.verify_signature_with_key(leaf.subject_public_key()));
    assert!(matches!(
        leaf.verify_signature(leaf.subject_public_key()),
        Err(Error::VerificationFailed)
    ));
}

#[test]
fn certificate_names_are_immutable() {
    let cert = CertificateInfo::decode(ROOT).unwrap();
    let mut subject = cert.subject().clone();
    assert_eq!(subject.set_common_name("Evil"), Err(Error::ImmutableName));
    assert_eq!(cert.subject().common_name(), Some("Test Root"));
}

#[test]
fn self_signed_ca() {
    let signer = SoftSigner::new();
    let key = signer.create_key(PublicKeyFormat::EcdsaP256).unwrap();
    let public_key = signer.get_key_info(&key).unwrap();

    // Start with the subject of an existing certificate.
    let root = CertificateInfo::decode(ROOT).unwrap();
    let mut req = CertificateRequest::new(&public_key);
    req.set_subject(root.subject()).unwrap();
    req.subject_mut().set_common_name("Copied Root").unwrap();
    req.set_key_usage(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN).unwrap();
    req.set_basic_constraints(BasicConstraints::new(true, None)).unwrap();
    req.set_subject_alternative_names(vec![
        GeneralName::Uri("https://example.com/ca".into())
    ]).unwrap();
    req.set_valid_to(Time::years_from_now(5).unwrap()).unwrap();

    let cert = req.self_sign_with_private_key(&signer, &key).unwrap();
    assert_eq!(req.state(), RequestState::Signed);
    let cert = CertificateInfo::decode(cert).unwrap();
    assert_eq!(cert.subject().common_name(), Some("Copied Root"));
    assert_eq!(cert.subject().email_address(), Some("root@example.com"));
    assert_eq!(cert.issuer(), cert.subject());
    assert!(cert.is_certificate_authority());
    assert_eq!(
        cert.basic_constraints(), Some(BasicConstraints::new(true, None))
    );
    assert!(!cert.allows_key_usage(KeyUsage::DIGITAL_SIGNATURE));
    assert_eq!(cert.subject_alternative_names().len(), 1);
    assert!(cert.extension_for(&oid::CE_EXTENDED_KEY_USAGE).is_none());
    cert.verify_self_signed().unwrap();

    // PEM round trip of the new certificate.
    let pem = cert.to_pem();
    assert_eq!(
        CertificateInfo::from_pem(&pem).unwrap().to_bytes(), cert.to_bytes()
    );

    // Everything is frozen now.
    assert_eq!(
        req.set_valid_from(Time::now()), Err(Error::RequestAlreadySigned)
    );
    assert_eq!(
        req.set_extended_key_usage(vec![oid::KP_CLIENT_AUTH]),
        Err(Error::RequestAlreadySigned)
    );
    assert_eq!(
        req.set_subject_alternative_names(Vec::new()),
        Err(Error::RequestAlreadySigned)
    );
    assert_eq!(
        req.set_force_printable_strings(true),
        Err(Error::RequestAlreadySigned)
    );
    assert_eq!(
        req.remove_extension(&oid::CE_KEY_USAGE),
        Err(Error::RequestAlreadySigned)
    );
    assert_eq!(
        req.subject_mut().set_surname("Late"),
        Err(Error::RequestAlreadySigned)
    );
}
