/// `crash` command: fail on purpose with an unexpected error.
use anyhow::anyhow;

use crate::cli::args::{CrashArgs, CrashMode};
use crate::exit::Failure;

/// Run `cmdwrap crash`.
///
/// # Errors
///
/// Always fails with an unclassified error in `error` mode.
///
/// # Panics
///
/// Always panics in `panic` mode.
pub fn run(args: &CrashArgs) -> Result<(), Failure> {
    match args.mode {
        CrashMode::Error => {
            Err(anyhow!("simulated internal error").context("crash requested").into())
        }
        CrashMode::Panic => panic!("simulated panic"),
    }
}
