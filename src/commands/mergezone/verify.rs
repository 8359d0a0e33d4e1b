//! Checks on the zones to merge.
//!
//! Each check is pure: it looks at one or two zones (or parts of them) and
//! either passes or returns the [`MergeError`] that explains what is wrong.
//! The rollover stages are described by a [`Policy`] table that combines the
//! algorithm checks with the choice of output keys.
use std::fmt;
use std::str::FromStr;

use domain::base::iana::SecurityAlgorithm;
use domain::dnssec::validator::base::RrsigExt;
use domain::rdata::ZoneRecordData;
use tracing::debug;

use super::error::{DisplayAlgorithm, MergeError};
use super::zone::{rrsig_data, StoredRecord, Zone, ZoneRole};

//------------ SOA and origin ------------------------------------------------

/// Check that both zones have an SOA record with the same serial and owner.
pub fn verify_soa_and_origin(from: &Zone, to: &Zone) -> Result<(), MergeError> {
    let (Some(from_soa), Some(from_serial)) = (from.soa(), from.serial()) else {
        return Err(MergeError::MissingSoa {
            zone: ZoneRole::From,
        });
    };
    let (Some(to_soa), Some(to_serial)) = (to.soa(), to.serial()) else {
        return Err(MergeError::MissingSoa { zone: ZoneRole::To });
    };

    debug!("\"from\" zone has SOA serial {from_serial}");
    debug!("\"to\" zone has SOA serial {to_serial}");
    if from_serial != to_serial {
        return Err(MergeError::SerialMismatch {
            from: from_serial,
            to: to_serial,
        });
    }

    // Name equality ignores ASCII case.
    if from_soa.owner() != to_soa.owner() {
        return Err(MergeError::OriginMismatch {
            from: from_soa.owner().clone(),
            to: to_soa.owner().clone(),
        });
    }
    debug!("Both zones have owner name '{}'", from_soa.owner());

    Ok(())
}

//------------ Algorithms ----------------------------------------------------

/// Determine the single algorithm the zone is signed with.
///
/// Returns `Ok(None)` if the zone has no RRSIG records at all.
pub fn single_algorithm(
    zone: &Zone,
    role: ZoneRole,
) -> Result<Option<SecurityAlgorithm>, MergeError> {
    let mut algorithm = None;
    for (_, rrsig) in zone.rrsigs() {
        match algorithm {
            None => algorithm = Some(rrsig.algorithm()),
            Some(first) if first != rrsig.algorithm() => {
                return Err(MergeError::MixedAlgorithms {
                    zone: role,
                    first,
                    second: rrsig.algorithm(),
                })
            }
            Some(_) => {}
        }
    }

    debug!("{role} has {} resource records", zone.record_count());
    debug!(
        "{role} is signed using algorithm {}",
        DisplayAlgorithm(algorithm)
    );
    Ok(algorithm)
}

/// Whether any of the keys uses the algorithm.
///
/// A missing algorithm is never contained in any set of keys.
pub fn contains_algorithm(
    dnskeys: &[&StoredRecord],
    algorithm: Option<SecurityAlgorithm>,
) -> bool {
    let Some(algorithm) = algorithm else {
        return false;
    };
    dnskeys.iter().any(|record| match record.data() {
        ZoneRecordData::Dnskey(dnskey) => dnskey.algorithm() == algorithm,
        _ => false,
    })
}

//------------ DNSKEY signatures ---------------------------------------------

/// Cryptographic validation of a DNSKEY RRset.
pub trait DnskeyVerifier {
    /// Check that every signature validates the RRset formed by `dnskeys`.
    ///
    /// Both slices are guaranteed to be non-empty.
    fn verify(&self, dnskeys: &[&StoredRecord], signatures: &[&StoredRecord])
        -> Result<(), String>;
}

/// Validates DNSKEY signatures with the DNSSEC support of `domain`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomainVerifier;

impl DnskeyVerifier for DomainVerifier {
    fn verify(
        &self,
        dnskeys: &[&StoredRecord],
        signatures: &[&StoredRecord],
    ) -> Result<(), String> {
        let mut rrset: Vec<StoredRecord> = dnskeys.iter().map(|&record| record.clone()).collect();

        for &record in signatures {
            let Some(rrsig) = rrsig_data(record) else {
                return Err(format!("not an RRSIG record: {record}"));
            };

            let mut signed_data = Vec::new();
            rrsig
                .signed_data(&mut signed_data, rrset.as_mut_slice())
                .map_err(|_| "cannot compose the signed data".to_string())?;

            let valid = dnskeys
                .iter()
                .filter_map(|record| match record.data() {
                    ZoneRecordData::Dnskey(dnskey) => Some(dnskey),
                    _ => None,
                })
                .filter(|dnskey| {
                    dnskey.algorithm() == rrsig.algorithm() && dnskey.key_tag() == rrsig.key_tag()
                })
                .any(|dnskey| rrsig.verify_signed_data(dnskey, &signed_data).is_ok());

            if !valid {
                return Err(format!(
                    "signature with key tag {} and algorithm {} does not validate",
                    rrsig.key_tag(),
                    rrsig.algorithm()
                ));
            }
        }
        Ok(())
    }
}

/// Validate a DNSKEY RRset with a set of signatures.
///
/// `keys` and `signatures` name the zones the records come from, for the
/// error message.
pub fn verify_dnskey_signatures(
    verifier: &impl DnskeyVerifier,
    dnskeys: &[&StoredRecord],
    signatures: &[&StoredRecord],
    keys: ZoneRole,
    signed_by: ZoneRole,
) -> Result<(), MergeError> {
    let invalid = |reason: &str| MergeError::SignatureInvalid {
        keys,
        signatures: signed_by,
        reason: reason.into(),
    };

    if dnskeys.is_empty() {
        return Err(invalid("there are no DNSKEY records"));
    }
    if signatures.is_empty() {
        return Err(invalid("there are no RRSIG records over the DNSKEY RRset"));
    }

    verifier
        .verify(dnskeys, signatures)
        .map_err(|reason| invalid(&reason))?;

    debug!(
        "DNSKEY RRset of {keys} validated with {} RRSIG(s) of {signed_by}",
        signatures.len()
    );
    Ok(())
}

//------------ Stage ---------------------------------------------------------

/// The stage of an algorithm rollover to produce a zone for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Signatures of the new algorithm are published, keys are not.
    One,

    /// Keys and signatures of both algorithms are published.
    Two,

    /// The old key is gone, its signatures are still published.
    Three,
}

impl Stage {
    /// The policy for producing a zone for this stage.
    pub fn policy(self) -> &'static Policy {
        match self {
            Stage::One => &STAGE_ONE,
            Stage::Two => &STAGE_TWO,
            Stage::Three => &STAGE_THREE,
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Stage::One),
            "2" => Ok(Stage::Two),
            "3" => Ok(Stage::Three),
            _ => Err(format!("unknown stage '{s}', expected 1, 2 or 3")),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::One => f.write_str("1"),
            Stage::Two => f.write_str("2"),
            Stage::Three => f.write_str("3"),
        }
    }
}

//------------ Policy --------------------------------------------------------

/// A requirement on the keys of one of the zones.
#[derive(Clone, Copy, Debug)]
pub struct AlgorithmRule {
    /// The zone whose keys are checked.
    pub zone: ZoneRole,

    /// The zone whose signing algorithm is looked for.
    pub algorithm_of: ZoneRole,

    /// Whether the keys must or must not have the algorithm.
    pub present: bool,
}

/// What the zone for a rollover stage consists of.
#[derive(Clone, Copy, Debug)]
pub struct Policy {
    /// The requirements on the keys of the input zones.
    pub rules: &'static [AlgorithmRule],

    /// The zone whose keys are published.
    pub output_keys: ZoneRole,

    /// The zones whose DNSKEY signatures must validate the published keys.
    pub validated_by: &'static [ZoneRole],
}

const fn rule(zone: ZoneRole, algorithm_of: ZoneRole, present: bool) -> AlgorithmRule {
    AlgorithmRule {
        zone,
        algorithm_of,
        present,
    }
}

static STAGE_ONE: Policy = Policy {
    rules: &[
        rule(ZoneRole::From, ZoneRole::From, true),
        rule(ZoneRole::From, ZoneRole::To, false),
        rule(ZoneRole::To, ZoneRole::From, true),
        rule(ZoneRole::To, ZoneRole::To, true),
    ],
    output_keys: ZoneRole::From,
    validated_by: &[ZoneRole::From],
};

static STAGE_TWO: Policy = Policy {
    rules: &[
        rule(ZoneRole::From, ZoneRole::From, true),
        rule(ZoneRole::From, ZoneRole::To, true),
        rule(ZoneRole::To, ZoneRole::From, true),
        rule(ZoneRole::To, ZoneRole::To, true),
    ],
    output_keys: ZoneRole::To,
    validated_by: &[ZoneRole::From, ZoneRole::To],
};

static STAGE_THREE: Policy = Policy {
    rules: &[
        rule(ZoneRole::From, ZoneRole::From, true),
        rule(ZoneRole::From, ZoneRole::To, true),
        rule(ZoneRole::To, ZoneRole::From, false),
        rule(ZoneRole::To, ZoneRole::To, true),
    ],
    output_keys: ZoneRole::To,
    validated_by: &[ZoneRole::To],
};

/// The DNSKEY material and signing algorithm of one zone.
#[derive(Clone, Copy, Debug)]
pub struct ZoneKeys<'r, 'a> {
    pub dnskeys: &'r [&'a StoredRecord],
    pub signatures: &'r [&'a StoredRecord],
    pub algorithm: Option<SecurityAlgorithm>,
}

impl Policy {
    /// Check the keys of both zones and select the keys to publish.
    ///
    /// The selected keys are validated with the DNSKEY signatures of each
    /// zone the policy names.
    pub fn apply<'r, 'a>(
        &self,
        from: ZoneKeys<'r, 'a>,
        to: ZoneKeys<'r, 'a>,
        verifier: &impl DnskeyVerifier,
    ) -> Result<&'r [&'a StoredRecord], MergeError> {
        let keys_of = |role| match role {
            ZoneRole::From => from,
            ZoneRole::To => to,
        };

        for rule in self.rules {
            let algorithm = keys_of(rule.algorithm_of).algorithm;
            let contained = contains_algorithm(keys_of(rule.zone).dnskeys, algorithm);
            match (rule.present, contained) {
                (true, false) => {
                    return Err(MergeError::MissingAlgorithm {
                        zone: rule.zone,
                        algorithm,
                    })
                }
                (false, true) => {
                    return Err(MergeError::UnexpectedAlgorithm {
                        zone: rule.zone,
                        algorithm,
                    })
                }
                _ => {}
            }
        }

        let output = keys_of(self.output_keys).dnskeys;
        for &signed_by in self.validated_by {
            verify_dnskey_signatures(
                verifier,
                output,
                keys_of(signed_by).signatures,
                self.output_keys,
                signed_by,
            )?;
        }
        Ok(output)
    }
}

//============ Tests =========================================================
