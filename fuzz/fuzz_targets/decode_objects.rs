#![no_main]

use libfuzzer_sys::fuzz_target;
use dercert::der::{decode_all, Mode};
use dercert::cert::CertificateInfo;
use dercert::crypto::PublicKey;

fuzz_target!(|data: &[u8]| {
    let (which, data) = match data.split_first() {
        Some((first, data)) => (*first, data),
        None => return,
    };

    match which % 4 {
        0 => { let _ = decode_all(data.to_vec(), Mode::Strict); },
        1 => { let _ = decode_all(data.to_vec(), Mode::Lenient); },
        2 => { let _ = CertificateInfo::decode(data.to_vec()); },
        3 => { let _ = PublicKey::decode(data.to_vec()); },
        _ => panic!("what?"),
    }
});
