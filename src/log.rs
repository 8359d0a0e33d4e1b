//! Diagnostic logging.
//!
//! Log output goes to the stderr of the [`Env`] so that it can be captured
//! in tests, just like error output.
use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;

use crate::env::Env;

/// Install the log subscriber for the duration of a command.
///
/// Only warnings and errors are logged unless `verbose` is set, in which
/// case the progress of the merge is logged as well. Logging stops when the
/// returned guard is dropped.
pub fn init(env: &impl Env, verbose: bool) -> DefaultGuard {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let stderr = env.stderr();
    let ansi = stderr.is_terminal();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(stderr)
        .with_max_level(level)
        .with_ansi(ansi)
        .with_target(false)
        .without_time()
        .compact()
        .finish();

    tracing::subscriber::set_default(subscriber)
}
