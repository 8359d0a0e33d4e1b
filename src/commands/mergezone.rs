use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use clap::builder::ValueParser;
use lexopt::Arg;
use tracing::info;

use crate::env::Env;
use crate::error::{Context, Error};
use crate::util::OutputFile;
use crate::Args;

use self::merge::merge_zones;
use self::verify::{DomainVerifier, Stage};
use self::zone::{write_records, StoredName, Zone};

use super::{parse_os, Command, LdnsCommand};

pub mod error;
pub mod index;
pub mod merge;
pub mod verify;
pub mod zone;

#[cfg(test)]
mod testing;

#[derive(Clone, Debug, PartialEq, Eq, clap::Args)]
pub struct MergeZone {
    /// The zone signed with the algorithm that is rolled away from
    #[arg(short = 'f', long = "from", value_name = "FILE")]
    from_zone: PathBuf,

    /// The zone signed with the algorithm that is rolled to
    #[arg(short = 't', long = "to", value_name = "FILE")]
    to_zone: PathBuf,

    /// Write the merged zone to this file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    out_zone: PathBuf,

    /// The stage of the rollover to produce a zone for (1, 2 or 3)
    #[arg(
        short = 's',
        long = "stage",
        value_name = "STAGE",
        value_parser = ValueParser::new(Stage::from_str)
    )]
    stage: Stage,

    /// The origin for zone files with relative names and no $ORIGIN
    #[arg(
        long = "origin",
        value_name = "NAME",
        value_parser = ValueParser::new(MergeZone::parse_origin)
    )]
    origin: Option<StoredName>,
}

const LDNS_HELP: &str = "\
ldns-mergezone

Usage:
\tldns-mergezone -f <from-zone> -t <to-zone> [-1] [-2] [-3] -o <out-zone> [-v]
\tldns-mergezone -h

\t-f <from-zone> Zone signed with the \"from\" algorithm
\t-t <to-zone>   Zone signed with the \"to\" algorithm
\t-1             Produce first output zone type
\t-2             Produce second output zone type
\t-3             Produce third output zone type
\t               (note: you must specify one of -1, -2, -3)
\t-o <out-zone>  Write output to <out-zone>
\t               (an existing <out-zone> is only replaced on success)
\t-v             Be verbose

\t-h                 Print this help message
";

impl LdnsCommand for MergeZone {
    const NAME: &'static str = "mergezone";
    const HELP: &'static str = LDNS_HELP;

    fn parse_ldns<I: IntoIterator<Item = OsString>>(args: I) -> Result<Args, Error> {
        let mut from_zone = None;
        let mut to_zone = None;
        let mut out_zone = None;
        let mut stage = None;
        let mut verbose = false;

        let mut parser = lexopt::Parser::from_args(args);

        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('f') => from_zone = Some(parser.value()?),
                Arg::Short('t') => to_zone = Some(parser.value()?),
                Arg::Short('o') => out_zone = Some(parser.value()?),
                Arg::Short('1') => stage = Some(Stage::One),
                Arg::Short('2') => stage = Some(Stage::Two),
                Arg::Short('3') => stage = Some(Stage::Three),
                Arg::Short('v') => verbose = true,
                Arg::Short('h') => return Ok(Self::report_help()),
                Arg::Short(x) => return Err(format!("Invalid short option: -{x}").into()),
                Arg::Long(x) => {
                    return Err(format!("Long options are not supported, but `--{x}` given").into())
                }
                Arg::Value(val) => {
                    return Err(format!("Unexpected argument: {}", val.to_string_lossy()).into())
                }
            }
        }

        let Some(from_zone) = from_zone else {
            return Err("You must specify a \"from\" zone with -f!".into());
        };
        let Some(to_zone) = to_zone else {
            return Err("You must specify a \"to\" zone with -t!".into());
        };
        let Some(out_zone) = out_zone else {
            return Err("You must specify an output zone file with -o!".into());
        };
        let Some(stage) = stage else {
            return Err("You must specify an output zone type with -1, -2 or -3!".into());
        };

        Ok(Args {
            verbose,
            command: Command::MergeZone(Self {
                from_zone: from_zone.into(),
                to_zone: to_zone.into(),
                out_zone: out_zone.into(),
                stage,
                origin: None,
            }),
        })
    }
}

impl MergeZone {
    fn parse_origin(arg: &str) -> Result<StoredName, Error> {
        parse_os("--origin", arg.as_ref())
    }

    pub fn execute(self, env: impl Env) -> Result<(), Error> {
        let from = Zone::read(&env, &self.from_zone, self.origin.as_ref())
            .context("reading the \"from\" zone")?;
        info!(
            "Read {} records from '{}'",
            from.record_count(),
            self.from_zone.display()
        );

        let to = Zone::read(&env, &self.to_zone, self.origin.as_ref())
            .context("reading the \"to\" zone")?;
        info!("Read {} records from '{}'", to.record_count(), self.to_zone.display());

        let merged = merge_zones(&from, &to, self.stage, &DomainVerifier)
            .map_err(Error::from)
            .with_context(|| {
                format!(
                    "merging '{}' and '{}'",
                    self.from_zone.display(),
                    self.to_zone.display()
                )
            })?;

        // The output is only created once the merge has succeeded.
        let mut out = OutputFile::create(&env, &self.out_zone)?;
        write_records(&mut out, merged.records().iter().copied()).map_err(|err| {
            Error::from(err).context(&format!("writing '{}'", self.out_zone.display()))
        })?;
        out.commit()?;

        info!(
            "Wrote {} records to '{}' ({})",
            merged.records().len(),
            self.out_zone.display(),
            merged.report()
        );
        Ok(())
    }
}

//============ Tests =========================================================
