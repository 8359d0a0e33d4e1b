//! Merging the records of two zones.
use std::fmt;

use domain::base::iana::SecurityAlgorithm;
use domain::base::Rtype;
use domain::rdata::ZoneRecordData;
use tracing::{debug, warn};

use super::error::{DisplayAlgorithm, MergeError};
use super::index::{DnssecIndex, SignatureKey};
use super::verify::{
    single_algorithm, verify_dnskey_signatures, verify_soa_and_origin, DnskeyVerifier, Stage,
    ZoneKeys,
};
use super::zone::{StoredRecord, Zone, ZoneRole};

//------------ MergedZone ----------------------------------------------------

/// The zone produced by merging two zones.
///
/// The records are borrowed from the input zones and are in the order in
/// which they are to be written.
#[derive(Clone, Debug)]
pub struct MergedZone<'a> {
    records: Vec<&'a StoredRecord>,
    report: MergeReport,
}

impl<'a> MergedZone<'a> {
    pub fn records(&self) -> &[&'a StoredRecord] {
        &self.records
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }
}

//------------ MergeReport ---------------------------------------------------

/// Statistics about a merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub stage: Stage,
    pub from_algorithm: Option<SecurityAlgorithm>,
    pub to_algorithm: Option<SecurityAlgorithm>,

    /// The number of records copied from the "from" zone as they are.
    pub copied: usize,

    /// The number of signatures paired with a signature from the "to" zone.
    pub paired_signatures: usize,

    /// The number of DNSKEY records published.
    pub dnskeys: usize,

    /// The number of signatures over the DNSKEY RRset published.
    pub dnskey_signatures: usize,

    /// The number of signatures of the "to" zone without a counterpart.
    pub dropped_signatures: usize,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {} zone from algorithm {} to {}: {} DNSKEY(s), {} DNSKEY RRSIG(s), {} RRSIG pair(s), {} other record(s)",
            self.stage,
            DisplayAlgorithm(self.from_algorithm),
            DisplayAlgorithm(self.to_algorithm),
            self.dnskeys,
            self.dnskey_signatures,
            self.paired_signatures,
            self.copied,
        )
    }
}

//------------ merge_zones ---------------------------------------------------

/// Merge two zones for a stage of an algorithm rollover.
///
/// Both zones are checked against each other and against the requirements
/// of the stage before any record is selected. Nothing is written here, so
/// a failed merge leaves no partial output behind.
pub fn merge_zones<'a>(
    from: &'a Zone,
    to: &'a Zone,
    stage: Stage,
    verifier: &impl DnskeyVerifier,
) -> Result<MergedZone<'a>, MergeError> {
    let from_index = DnssecIndex::build(ZoneRole::From, from.records())?;
    let to_index = DnssecIndex::build(ZoneRole::To, to.records())?;

    verify_soa_and_origin(from, to)?;
    let from_algorithm = single_algorithm(from, ZoneRole::From)?;
    let to_algorithm = single_algorithm(to, ZoneRole::To)?;

    for (role, index) in [(ZoneRole::From, &from_index), (ZoneRole::To, &to_index)] {
        verify_dnskey_signatures(
            verifier,
            index.dnskeys(),
            index.dnskey_signatures(),
            role,
            role,
        )?;
    }

    let output_keys = stage.policy().apply(
        ZoneKeys {
            dnskeys: from_index.dnskeys(),
            signatures: from_index.dnskey_signatures(),
            algorithm: from_algorithm,
        },
        ZoneKeys {
            dnskeys: to_index.dnskeys(),
            signatures: to_index.dnskey_signatures(),
            algorithm: to_algorithm,
        },
        verifier,
    )?;

    let mut report = MergeReport {
        stage,
        from_algorithm,
        to_algorithm,
        copied: 0,
        paired_signatures: 0,
        dnskeys: 0,
        dnskey_signatures: 0,
        dropped_signatures: 0,
    };
    let records = reconstruct(from, &from_index, &to_index, output_keys, &mut report)?;

    debug!("Merged zone has {} records: {report}", records.len());
    Ok(MergedZone { records, report })
}

/// Whether the DNSKEY RRset and its signatures have been emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DnskeyBlock {
    Pending,
    Written,
}

/// Walk the "from" zone and select the records of the merged zone.
///
/// The SOA record comes first. Every RRSIG is followed by its counterpart
/// from the "to" zone. The published keys and all DNSKEY signatures of both
/// zones take the place of the first DNSKEY signature of the "from" zone.
fn reconstruct<'a>(
    from: &'a Zone,
    from_index: &DnssecIndex<'a>,
    to_index: &DnssecIndex<'a>,
    output_keys: &[&'a StoredRecord],
    report: &mut MergeReport,
) -> Result<Vec<&'a StoredRecord>, MergeError> {
    let mut records = Vec::with_capacity(from.record_count() + to_index.signature_count());
    records.extend(from.soa());

    let mut block = DnskeyBlock::Pending;
    for record in from.records() {
        match record.data() {
            ZoneRecordData::Dnskey(_) => {}
            ZoneRecordData::Rrsig(rrsig) if rrsig.type_covered() == Rtype::DNSKEY => {
                if block == DnskeyBlock::Pending {
                    records.extend_from_slice(output_keys);
                    records.extend_from_slice(from_index.dnskey_signatures());
                    records.extend_from_slice(to_index.dnskey_signatures());
                    report.dnskeys = output_keys.len();
                    report.dnskey_signatures =
                        from_index.dnskey_signatures().len() + to_index.dnskey_signatures().len();
                    block = DnskeyBlock::Written;
                }
            }
            ZoneRecordData::Rrsig(rrsig) => {
                let key = SignatureKey::new(rrsig.type_covered(), record.owner());
                let Some(counterpart) = to_index.find_signature(&key) else {
                    return Err(MergeError::UnmatchedSignature { key });
                };
                records.push(record);
                records.push(counterpart);
                report.paired_signatures += 1;
            }
            _ => {
                records.push(record);
                report.copied += 1;
            }
        }
    }

    if block == DnskeyBlock::Pending {
        return Err(MergeError::NoDnskeyBlockWritten);
    }

    report.dropped_signatures = to_index
        .signature_count()
        .saturating_sub(report.paired_signatures);
    if report.dropped_signatures > 0 {
        warn!(
            "Dropped {} RRSIG(s) of the \"to\" zone without a counterpart in the \"from\" zone",
            report.dropped_signatures
        );
    }

    Ok(records)
}

//============ Tests =========================================================
