//! Indexing the DNSSEC records of a zone.
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;

use domain::base::Rtype;
use domain::rdata::ZoneRecordData;
use tracing::debug;

use super::error::MergeError;
use super::zone::{StoredName, StoredRecord, ZoneRole};

//------------ SignatureKey --------------------------------------------------

/// The key under which a signature is matched with its counterpart.
///
/// Owner names are compared case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    type_covered: Rtype,
    owner: String,
}

impl SignatureKey {
    pub fn new(type_covered: Rtype, owner: &StoredName) -> Self {
        Self {
            type_covered,
            owner: owner.to_string().to_ascii_lowercase(),
        }
    }

    pub fn type_covered(&self) -> Rtype {
        self.type_covered
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.owner, self.type_covered)
    }
}

//------------ DnssecIndex ---------------------------------------------------

/// The DNSSEC records of a zone.
///
/// The index keeps the DNSKEY records and the signatures over them in zone
/// order and maps every other signature by the type it covers and its owner
/// name. There can be only one such signature for each key, so a zone is
/// expected to be signed with a single algorithm.
#[derive(Clone, Debug, Default)]
pub struct DnssecIndex<'a> {
    dnskeys: Vec<&'a StoredRecord>,
    dnskey_signatures: Vec<&'a StoredRecord>,
    signatures: HashMap<SignatureKey, &'a StoredRecord>,
}

impl<'a> DnssecIndex<'a> {
    /// Index the records of a zone.
    ///
    /// Records that are neither DNSKEY nor RRSIG records are skipped.
    pub fn build(
        zone: ZoneRole,
        records: impl IntoIterator<Item = &'a StoredRecord>,
    ) -> Result<Self, MergeError> {
        let mut index = Self::default();
        for record in records {
            match record.data() {
                ZoneRecordData::Dnskey(_) => index.dnskeys.push(record),
                ZoneRecordData::Rrsig(rrsig) if rrsig.type_covered() == Rtype::DNSKEY => {
                    index.dnskey_signatures.push(record)
                }
                ZoneRecordData::Rrsig(rrsig) => {
                    let key = SignatureKey::new(rrsig.type_covered(), record.owner());
                    match index.signatures.entry(key) {
                        Entry::Occupied(entry) => {
                            return Err(MergeError::DuplicateSignature {
                                zone,
                                key: entry.key().clone(),
                            })
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(record);
                        }
                    }
                }
                _ => {}
            }
        }

        debug!("{zone} has {} DNSKEY records", index.dnskeys.len());
        debug!(
            "{zone} has {} DNSKEY RRSIG records",
            index.dnskey_signatures.len()
        );
        debug!("{zone} has {} other RRSIG records", index.signatures.len());

        Ok(index)
    }

    /// The DNSKEY records of the zone.
    pub fn dnskeys(&self) -> &[&'a StoredRecord] {
        &self.dnskeys
    }

    /// The RRSIG records covering the DNSKEY RRset.
    pub fn dnskey_signatures(&self) -> &[&'a StoredRecord] {
        &self.dnskey_signatures
    }

    /// Find the signature for an owner name and covered type.
    pub fn find_signature(&self, key: &SignatureKey) -> Option<&'a StoredRecord> {
        self.signatures.get(key).copied()
    }

    /// The number of signatures other than those over the DNSKEY RRset.
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}

//============ Tests =========================================================
