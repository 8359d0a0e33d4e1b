//! Merge two DNSSEC-signed zones for an algorithm rollover.
//!
//! Given two copies of the same zone, one signed with the "from" algorithm
//! and one signed with the "to" algorithm, the `merge` command produces the
//! zone to publish at one of the three stages of the rollover. The command
//! is also available as `ldns-mergezone` with the options of the original
//! ldns-based tool.
use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use commands::{mergezone::MergeZone, LdnsCommand};
use env::Env;
use error::Error;

pub use self::args::Args;

pub mod args;
pub mod commands;
pub mod env;
pub mod error;
pub mod log;
pub mod util;

pub fn parse_args(env: impl Env) -> Result<Args, Error> {
    if let Some(args) = try_ldns_compatibility(env.args_os())? {
        return Ok(args);
    }
    let args = Args::try_parse_from(env.args_os())?;
    Ok(args)
}

/// Parse the arguments in the way of an `ldns-*` command, if invoked as one.
///
/// Returns `Ok(None)` if the binary name does not match a supported `ldns`
/// command.
pub fn try_ldns_compatibility<I: IntoIterator<Item = OsString>>(
    args: I,
) -> Result<Option<Args>, Error> {
    let mut args_iter = args.into_iter();
    let binary_path = args_iter.next().ok_or("Missing binary name")?;

    let binary_name = extract_binary_name(Path::new(&binary_path))?;

    let res = match binary_name {
        "ldns-mergezone" => MergeZone::parse_ldns_args(args_iter),
        _ => return Ok(None),
    };

    res.map(Some)
}

/// Get the file name of the binary from the path it was invoked with.
pub fn extract_binary_name(binary_path: &Path) -> Result<&str, Error> {
    let binary_name = binary_path
        .file_name()
        .ok_or::<Error>("Missing binary file name".into())?
        .to_str()
        .ok_or("Binary file name is not valid Unicode")?;
    Ok(binary_name)
}

/// Parse the arguments and execute the command, returning the exit code.
pub fn run(env: impl Env) -> u8 {
    let res = parse_args(&env).and_then(|args| args.execute(&env));
    match res {
        Ok(()) => 0,
        Err(err) => {
            err.pretty_print(&env);
            err.exit_code()
        }
    }
}
