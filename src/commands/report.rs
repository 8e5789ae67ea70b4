/// `report` command: show telemetry reports recorded in the metrics file.
use crate::cli::OutputCtx;
use crate::cli::args::ReportArgs;
use crate::cli::output::write_reports;
use crate::config::Config;
use crate::exit::Failure;
use crate::telemetry::{ReportError, read_reports};

/// Run `cmdwrap report`.
///
/// # Errors
///
/// Returns `ReportError::NoMetricsFile` when no metrics file is configured,
/// `ReportError::MissingFile` when it does not exist yet, and an unclassified
/// failure when it cannot be read or parsed.
pub fn run(args: &ReportArgs, ctx: &OutputCtx, config: &Config) -> Result<(), Failure> {
    let path = config
        .metrics
        .file
        .as_deref()
        .ok_or(ReportError::NoMetricsFile)?;
    if !path.exists() {
        return Err(ReportError::MissingFile {
            path: path.to_path_buf(),
        }
        .into());
    }

    let mut reports = read_reports(path)?;
    if let Some(n) = args.last {
        let skip = reports.len().saturating_sub(n);
        reports.drain(..skip);
    }

    write_reports(&reports, ctx);
    Ok(())
}
