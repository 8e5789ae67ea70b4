/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod crash;
pub mod report;
pub mod scan;

use crate::cli::OutputCtx;
use crate::cli::args::Command;
use crate::config::Config;
use crate::exit::Failure;

/// Dispatch a parsed `Command` to its handler.
///
/// # Errors
///
/// Returns `Failure` on any command failure; the invocation wrapper decides
/// the exit code from it.
pub fn dispatch(command: &Command, ctx: &OutputCtx, config: &Config) -> Result<(), Failure> {
    match command {
        Command::Scan(args) => scan::run(args, ctx),
        Command::Report(args) => report::run(args, ctx, config),
        Command::Crash(args) => crash::run(args),
    }
}
