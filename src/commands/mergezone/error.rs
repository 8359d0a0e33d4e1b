//! The reasons a merge can fail.
//!
//! [`MergeError`] is returned by the checks and the merge itself and is
//! turned into a program [`Error`] with a generic failure exit code.
use std::fmt;

use domain::base::iana::SecurityAlgorithm;
use domain::base::Serial;

use crate::error::Error;

use super::index::SignatureKey;
use super::zone::{StoredName, ZoneRole};

//------------ MergeError ----------------------------------------------------

/// A reason why two zones cannot be merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeError {
    /// A zone has no SOA record.
    MissingSoa { zone: ZoneRole },

    /// The SOA serials of the zones differ.
    SerialMismatch { from: Serial, to: Serial },

    /// The owner names of the SOA records of the zones differ.
    OriginMismatch { from: StoredName, to: StoredName },

    /// A zone has signatures made with more than one algorithm.
    MixedAlgorithms {
        zone: ZoneRole,
        first: SecurityAlgorithm,
        second: SecurityAlgorithm,
    },

    /// A zone has more than one signature for the same owner and type.
    DuplicateSignature { zone: ZoneRole, key: SignatureKey },

    /// A DNSKEY RRset could not be validated with its signatures.
    SignatureInvalid {
        keys: ZoneRole,
        signatures: ZoneRole,
        reason: String,
    },

    /// The keys of a zone lack an algorithm the rollover stage requires.
    MissingAlgorithm {
        zone: ZoneRole,
        algorithm: Option<SecurityAlgorithm>,
    },

    /// The keys of a zone have an algorithm the rollover stage forbids.
    UnexpectedAlgorithm {
        zone: ZoneRole,
        algorithm: Option<SecurityAlgorithm>,
    },

    /// A signature of the "from" zone has no counterpart in the "to" zone.
    UnmatchedSignature { key: SignatureKey },

    /// The "from" zone has no signature over its DNSKEY RRset.
    NoDnskeyBlockWritten,
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::MissingSoa { zone } => write!(f, "{zone} is missing an SOA record"),
            MergeError::SerialMismatch { from, to } => {
                write!(f, "SOA serial mismatch between \"from\" and \"to\" zone ({from} != {to})")
            }
            MergeError::OriginMismatch { from, to } => write!(
                f,
                "owner name of \"from\" and \"to\" SOA record differs ({from} != {to})"
            ),
            MergeError::MixedAlgorithms {
                zone,
                first,
                second,
            } => write!(
                f,
                "{zone} has RRSIGs for more than one algorithm ({first} and {second})"
            ),
            MergeError::DuplicateSignature { zone, key } => {
                write!(f, "{zone} has a second RRSIG for {key}")
            }
            MergeError::SignatureInvalid {
                keys,
                signatures,
                reason,
            } => {
                if keys == signatures {
                    write!(f, "DNSKEY RRset of {keys} cannot be validated: {reason}")
                } else {
                    write!(
                        f,
                        "DNSKEY RRset of {keys} cannot be validated with the DNSKEY RRSIGs of {signatures}: {reason}"
                    )
                }
            }
            MergeError::MissingAlgorithm { zone, algorithm } => write!(
                f,
                "{zone} has no DNSKEY with algorithm {}",
                DisplayAlgorithm(*algorithm)
            ),
            MergeError::UnexpectedAlgorithm { zone, algorithm } => write!(
                f,
                "{zone} must not have a DNSKEY with algorithm {}",
                DisplayAlgorithm(*algorithm)
            ),
            MergeError::UnmatchedSignature { key } => {
                write!(f, "no matching RRSIG in \"to\" zone for {key}")
            }
            MergeError::NoDnskeyBlockWritten => {
                f.write_str("\"from\" zone has no RRSIG over its DNSKEY RRset")
            }
        }
    }
}

impl std::error::Error for MergeError {}

impl From<MergeError> for Error {
    fn from(error: MergeError) -> Self {
        Error::new(&error.to_string())
    }
}

//------------ DisplayAlgorithm ----------------------------------------------

/// Displays an algorithm, including the absence of one.
pub struct DisplayAlgorithm(pub Option<SecurityAlgorithm>);

impl fmt::Display for DisplayAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(algorithm) => write!(f, "{algorithm} ({})", algorithm.to_int()),
            None => f.write_str("<none>"),
        }
    }
}
