//! Helpers for the tests of the merge command.
use std::fmt::Write as _;

use bytes::Bytes;
use domain::base::iana::{Class, SecurityAlgorithm};
use domain::base::{Record, Rtype, Ttl};
use domain::dnssec::validator::base::RrsigExt;
use domain::rdata::{Dnskey, Rrsig, ZoneRecordData};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
};

use super::verify::DnskeyVerifier;
use super::zone::{rrsig_data, StoredName, StoredRecord};

pub const ECDSA: SecurityAlgorithm = SecurityAlgorithm::ECDSAP256SHA256;
pub const ED25519: SecurityAlgorithm = SecurityAlgorithm::ED25519;

pub const APEX: &str = "example.test.";

const VALIDITY: &str = "20300101000000 20240101000000";
const SIGNATURE: &str = "c2lnbmF0dXJl";

fn fake_key(algorithm: SecurityAlgorithm) -> &'static str {
    if algorithm == ECDSA {
        "AQIDBAUGBwg="
    } else {
        "CAcGBQQDAgE="
    }
}

fn fake_key_tag(algorithm: SecurityAlgorithm) -> u16 {
    1000 + u16::from(algorithm.to_int())
}

/// The records of the test zone without its DNSKEY RRset.
///
/// Every RRset is signed by a single RRSIG made with `algorithm`.
fn body(serial: u32, algorithm: SecurityAlgorithm, dnskey_block: &str) -> String {
    let alg = algorithm.to_int();
    let tag = fake_key_tag(algorithm);
    let rrsig = |owner: &str, rtype: &str, labels: u8| {
        format!("{owner} 3600 IN RRSIG {rtype} {alg} {labels} 3600 {VALIDITY} {tag} {APEX} {SIGNATURE}\n")
    };

    let mut zone = String::new();
    zone.push_str(&format!(
        "{APEX} 3600 IN SOA ns.{APEX} admin.{APEX} {serial} 3600 900 604800 300\n"
    ));
    zone.push_str(&rrsig(APEX, "SOA", 2));
    zone.push_str(&format!("{APEX} 3600 IN NS ns.{APEX}\n"));
    zone.push_str(&rrsig(APEX, "NS", 2));
    zone.push_str(dnskey_block);
    zone.push_str(&format!("ns.{APEX} 3600 IN A 192.0.2.1\n"));
    zone.push_str(&rrsig(&format!("ns.{APEX}"), "A", 3));
    zone.push_str(&format!("ns.{APEX} 3600 IN AAAA 2001:db8::1\n"));
    zone.push_str(&rrsig(&format!("ns.{APEX}"), "AAAA", 3));
    zone
}

/// A zone with made up keys and signatures.
///
/// The zone has a DNSKEY for each of `keys` and all its RRSIGs use
/// `signed_with`. The signatures do not validate cryptographically.
pub fn zone_text(
    serial: u32,
    keys: &[SecurityAlgorithm],
    signed_with: SecurityAlgorithm,
) -> String {
    let mut block = String::new();
    for &algorithm in keys {
        writeln!(
            block,
            "{APEX} 3600 IN DNSKEY 257 3 {} {}",
            algorithm.to_int(),
            fake_key(algorithm)
        )
        .unwrap();
    }
    writeln!(
        block,
        "{APEX} 3600 IN RRSIG DNSKEY {} 2 3600 {VALIDITY} {} {APEX} {SIGNATURE}",
        signed_with.to_int(),
        fake_key_tag(signed_with),
    )
    .unwrap();
    body(serial, signed_with, &block)
}

/// A zone with real keys and a DNSKEY RRset signed by `signer`.
///
/// Only the DNSKEY RRset carries valid signatures.
pub fn signed_zone_text(serial: u32, keys: &[&TestKey], signer: &TestKey) -> String {
    let records: Vec<_> = keys.iter().map(|key| key.record()).collect();
    let mut block = String::new();
    for record in &records {
        writeln!(block, "{record}").unwrap();
    }
    writeln!(block, "{}", signer.sign_dnskeys(&records)).unwrap();
    body(serial, signer.algorithm, &block)
}

//------------ AlgorithmVerifier ---------------------------------------------

/// Accepts signatures whose algorithm is used by one of the keys.
pub struct AlgorithmVerifier;

impl DnskeyVerifier for AlgorithmVerifier {
    fn verify(
        &self,
        dnskeys: &[&StoredRecord],
        signatures: &[&StoredRecord],
    ) -> Result<(), String> {
        let has_key = |algorithm| {
            dnskeys.iter().any(|record| match record.data() {
                ZoneRecordData::Dnskey(dnskey) => dnskey.algorithm() == algorithm,
                _ => false,
            })
        };
        for record in signatures {
            let rrsig = rrsig_data(record).ok_or("not an RRSIG")?;
            if !has_key(rrsig.algorithm()) {
                return Err(format!("no key for algorithm {}", rrsig.algorithm()));
            }
        }
        Ok(())
    }
}

//------------ TestKey -------------------------------------------------------

enum KeyPairKind {
    Ed25519(Ed25519KeyPair),
    Ecdsa(EcdsaKeyPair),
}

/// A key pair for signing DNSKEY RRsets in tests.
pub struct TestKey {
    algorithm: SecurityAlgorithm,
    public_key: Bytes,
    pair: KeyPairKind,
}

impl TestKey {
    /// An Ed25519 key derived from a one-byte seed.
    pub fn ed25519(seed: u8) -> Self {
        let pair = Ed25519KeyPair::from_seed_unchecked(&[seed; 32]).unwrap();
        Self {
            algorithm: ED25519,
            public_key: Bytes::copy_from_slice(pair.public_key().as_ref()),
            pair: KeyPairKind::Ed25519(pair),
        }
    }

    /// A fresh ECDSA P-256 key.
    pub fn ecdsa() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng).unwrap();
        let pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();

        // DNSSEC leaves out the uncompressed point marker.
        let public_key = Bytes::copy_from_slice(&pair.public_key().as_ref()[1..]);
        Self {
            algorithm: ECDSA,
            public_key,
            pair: KeyPairKind::Ecdsa(pair),
        }
    }

    pub fn dnskey(&self) -> Dnskey<Bytes> {
        Dnskey::new(257, 3, self.algorithm, self.public_key.clone()).unwrap()
    }

    /// The DNSKEY record for the key at the zone apex.
    pub fn record(&self) -> StoredRecord {
        Record::new(
            apex(),
            Class::IN,
            Ttl::from_secs(3600),
            ZoneRecordData::Dnskey(self.dnskey()),
        )
    }

    /// Sign a DNSKEY RRset, returning the RRSIG record.
    pub fn sign_dnskeys(&self, dnskeys: &[StoredRecord]) -> StoredRecord {
        let rrsig = |signature: Bytes| {
            Rrsig::new(
                Rtype::DNSKEY,
                self.algorithm,
                2,
                Ttl::from_secs(3600),
                1_900_000_000.into(),
                1_700_000_000.into(),
                self.dnskey().key_tag(),
                apex(),
                signature,
            )
            .unwrap()
        };

        let mut rrset = dnskeys.to_vec();
        let mut signed_data = Vec::new();
        rrsig(Bytes::new())
            .signed_data(&mut signed_data, rrset.as_mut_slice())
            .unwrap();

        let signature = match &self.pair {
            KeyPairKind::Ed25519(pair) => Bytes::copy_from_slice(pair.sign(&signed_data).as_ref()),
            KeyPairKind::Ecdsa(pair) => {
                let sig = pair.sign(&SystemRandom::new(), &signed_data).unwrap();
                Bytes::copy_from_slice(sig.as_ref())
            }
        };

        Record::new(
            apex(),
            Class::IN,
            Ttl::from_secs(3600),
            ZoneRecordData::Rrsig(rrsig(signature)),
        )
    }
}

fn apex() -> StoredName {
    APEX.parse().unwrap()
}
