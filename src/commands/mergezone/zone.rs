//! Reading and writing zones.
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use domain::base::name::FlattenInto;
use domain::base::{Name, Record, Rtype, Serial};
use domain::rdata::{Rrsig, Soa, ZoneRecordData};
use domain::zonefile::inplace::{self, Entry};

use crate::env::Env;
use crate::error::Error;

//------------ Type aliases --------------------------------------------------

/// The owner and domain name type of records read from a zone file.
pub type StoredName = Name<Bytes>;

/// The record data type of records read from a zone file.
pub type StoredRecordData = ZoneRecordData<Bytes, StoredName>;

/// A record read from a zone file.
pub type StoredRecord = Record<StoredName, StoredRecordData>;

//------------ ZoneRole ------------------------------------------------------

/// The part a zone plays in a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneRole {
    /// The zone signed with the algorithm that is rolled away from.
    From,

    /// The zone signed with the algorithm that is rolled to.
    To,
}

impl fmt::Display for ZoneRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneRole::From => f.write_str("\"from\" zone"),
            ZoneRole::To => f.write_str("\"to\" zone"),
        }
    }
}

//------------ Zone ----------------------------------------------------------

/// A zone as read from a zone file.
///
/// The SOA record is kept apart from the other records, which stay in the
/// order of the file they were read from.
#[derive(Clone, Debug, Default)]
pub struct Zone {
    soa: Option<StoredRecord>,
    records: Vec<StoredRecord>,
}

impl Zone {
    /// Read a zone from a file.
    ///
    /// If `origin` is given it is used for relative names in a file that has
    /// no `$ORIGIN` directive.
    pub fn read(
        env: &impl Env,
        path: &Path,
        origin: Option<&StoredName>,
    ) -> Result<Self, Error> {
        let mut file = File::open(env.in_cwd(&path))
            .map_err(|err| Error::from(err).context(&format!("opening '{}'", path.display())))?;
        let mut reader = inplace::Zonefile::load(&mut file)
            .map_err(|err| Error::from(err).context(&format!("reading '{}'", path.display())))?;
        if let Some(origin) = origin {
            reader.set_origin(origin.clone());
        }
        Self::parse(reader)
            .map_err(|err| Error::new(&format!("Invalid zone file '{}': {err}", path.display())))
    }

    /// Parse a zone from a loaded zone file.
    pub fn parse(reader: inplace::Zonefile) -> Result<Self, ZoneError> {
        let mut zone = Zone::default();
        for entry in reader {
            let entry = entry.map_err(|err| ZoneError::Parse(err.to_string()))?;
            match entry {
                Entry::Record(record) => {
                    let record: StoredRecord = record.flatten_into();
                    zone.push(record)?;
                }
                Entry::Include { .. } => return Err(ZoneError::Include),
            }
        }
        Ok(zone)
    }

    fn push(&mut self, record: StoredRecord) -> Result<(), ZoneError> {
        if record.rtype() != Rtype::SOA {
            self.records.push(record);
        } else if let Some(soa) = &self.soa {
            return Err(ZoneError::SecondSoa(soa.owner().clone()));
        } else {
            self.soa = Some(record);
        }
        Ok(())
    }

    /// The SOA record of the zone, if it has one.
    pub fn soa(&self) -> Option<&StoredRecord> {
        self.soa.as_ref()
    }

    /// The serial of the SOA record of the zone, if it has one.
    pub fn serial(&self) -> Option<Serial> {
        self.soa_data().map(Soa::serial)
    }

    fn soa_data(&self) -> Option<&Soa<StoredName>> {
        match self.soa.as_ref()?.data() {
            ZoneRecordData::Soa(soa) => Some(soa),
            _ => None,
        }
    }

    /// All records of the zone other than the SOA, in file order.
    pub fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    /// The RRSIG records of the zone with their record data.
    pub fn rrsigs(&self) -> impl Iterator<Item = (&StoredRecord, &Rrsig<Bytes, StoredName>)> {
        self.records
            .iter()
            .filter_map(|record| rrsig_data(record).map(|rrsig| (record, rrsig)))
    }

    /// The number of records in the zone, including the SOA.
    pub fn record_count(&self) -> usize {
        self.records.len() + usize::from(self.soa.is_some())
    }
}

impl FromStr for Zone {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(inplace::Zonefile::from(s))
    }
}

/// Get the RRSIG data of a record, if it is an RRSIG record.
pub fn rrsig_data(record: &StoredRecord) -> Option<&Rrsig<Bytes, StoredName>> {
    match record.data() {
        ZoneRecordData::Rrsig(rrsig) => Some(rrsig),
        _ => None,
    }
}

/// Write records in zone file format, one record per line.
pub fn write_records<'a, W: io::Write>(
    writer: &mut W,
    records: impl IntoIterator<Item = &'a StoredRecord>,
) -> io::Result<()> {
    for record in records {
        writeln!(writer, "{record}")?;
    }
    Ok(())
}

//------------ ZoneError -----------------------------------------------------

/// A zone file could not be turned into a [`Zone`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZoneError {
    /// The zone file parser rejected the input.
    Parse(String),

    /// The zone file uses `$INCLUDE`.
    Include,

    /// The zone file has more than one SOA record.
    SecondSoa(StoredName),
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneError::Parse(err) => f.write_str(err),
            ZoneError::Include => f.write_str("$INCLUDE directive is not supported"),
            ZoneError::SecondSoa(owner) => {
                write!(f, "more than one SOA record, the first one is at {owner}")
            }
        }
    }
}

impl std::error::Error for ZoneError {}

//============ Tests =========================================================
