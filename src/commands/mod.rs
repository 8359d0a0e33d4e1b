//! The commands of _mergezone_.
pub mod mergezone;

use std::ffi::{OsStr, OsString};
use std::str::FromStr;

use crate::env::Env;
use crate::Args;

use super::error::Error;

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Merge two zones signed with different algorithms
    ///
    /// The "from" zone must be signed with the algorithm that is being
    /// rolled away from, the "to" zone with the algorithm that is being
    /// rolled to. Apart from their DNSSEC records the two zones must be
    /// identical, including the SOA serial.
    ///
    /// The stage selects the zone that is produced:
    ///
    /// 1: keys of the "from" zone, signatures of both zones
    ///    (the "to" zone must already publish both keys)
    ///
    /// 2: keys of the "to" zone, both algorithms published and used
    ///
    /// 3: keys of the "to" zone, after the "from" key has been removed
    #[command(name = "merge", verbatim_doc_comment)]
    MergeZone(self::mergezone::MergeZone),

    /// Report a string to stdout
    ///
    /// This is used for printing version information and some other
    /// information.
    #[command(skip)]
    Report(String),
}

impl Command {
    pub fn execute(self, env: impl Env) -> Result<(), Error> {
        match self {
            Self::MergeZone(mergezone) => mergezone.execute(env),
            Self::Report(s) => {
                writeln!(env.stdout(), "{s}");
                Ok(())
            }
        }
    }
}

/// A command that can be invoked in an LDNS compatibility mode
///
/// These commands do their own argument parsing, because clap cannot always
/// (easily) parse arguments in the same way that the ldns tools do.
///
/// The [`LdnsCommand::parse_ldns`] function should parse arguments and
/// return an error in case of a parsing failure. The help string provided
/// as [`LdnsCommand::HELP`] is automatically appended to returned errors.
pub trait LdnsCommand {
    const NAME: &'static str;
    const HELP: &'static str;

    fn parse_ldns<I: IntoIterator<Item = OsString>>(args: I) -> Result<Args, Error>;

    fn parse_ldns_args<I: IntoIterator<Item = OsString>>(args: I) -> Result<Args, Error> {
        match Self::parse_ldns(args) {
            Ok(c) => Ok(c),
            Err(e) => Err(Error::invalid_args(&format!("{e}\n\n{}", Self::HELP))),
        }
    }

    fn report_help() -> Args {
        Args::from(Command::Report(Self::HELP.into()))
    }
}

/// Utility function to parse an [`OsStr`] with a custom function
fn parse_os_with<T, E>(opt: &str, val: &OsStr, f: impl Fn(&str) -> Result<T, E>) -> Result<T, Error>
where
    E: std::fmt::Display,
{
    let Some(s) = val.to_str() else {
        return Err(Error::invalid_args(&format!(
            "Invalid value for {opt}: {val:?} is not valid unicode",
        )));
    };

    f(s).map_err(|e| Error::invalid_args(&format!("Invalid value {val:?} for {opt}: {e}")))
}

/// Utility function to parse an [`OsStr`] into a value via [`FromStr`]
fn parse_os<T: FromStr>(opt: &str, val: &OsStr) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    parse_os_with(opt, val, T::from_str)
}
