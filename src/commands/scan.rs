/// `scan` command: search files for a literal pattern.
use std::collections::BTreeSet;

use crate::cli::OutputCtx;
use crate::cli::args::ScanArgs;
use crate::cli::output::write_matches;
use crate::exit::Failure;
use crate::scan::{Finding, ScanError, SearchOptions, search, validate};
use crate::types::MatchOutput;

/// Run `cmdwrap scan`.
///
/// Matches are printed before the run ends; having any is reported as a
/// classified failure so the process exits 1.
///
/// # Errors
///
/// Returns `ScanError::FindingsReported` when the pattern matched,
/// `ScanError::EmptyPattern` / `ScanError::MissingTarget` for bad input, and
/// an unclassified failure when a file or directory cannot be read.
pub fn run(args: &ScanArgs, ctx: &OutputCtx) -> Result<(), Failure> {
    validate(&args.pattern, &args.paths)?;

    let opts = SearchOptions {
        ignore_case: args.ignore_case,
    };
    let findings = search(&args.paths, &args.pattern, opts)?;

    let output: Vec<MatchOutput> = findings.iter().map(to_output).collect();
    write_matches(&output, ctx);

    if findings.is_empty() {
        tracing::info!("no findings");
        return Ok(());
    }

    let files = findings.iter().map(|f| &f.path).collect::<BTreeSet<_>>().len();
    Err(ScanError::FindingsReported {
        count: findings.len(),
        files,
    }
    .into())
}

fn to_output(finding: &Finding) -> MatchOutput {
    MatchOutput {
        path: finding.path.display().to_string(),
        line: finding.line,
        column: finding.column,
        text: finding.text.clone(),
    }
}
