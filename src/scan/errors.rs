/// Errors from the scan domain layer.
use std::path::PathBuf;

use thiserror::Error;

use crate::exit::{Classified, ExitCode, Failure};

/// Expected outcomes of `scan` that end the run with a non-zero code.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The pattern matched at least once.
    #[error("{count} finding(s) reported in {files} file(s)")]
    FindingsReported {
        /// Total number of matches.
        count: usize,
        /// Number of distinct files with a match.
        files: usize,
    },

    /// An empty pattern would match every line.
    #[error("Pattern must not be empty")]
    EmptyPattern,

    /// A path given on the command line does not exist.
    #[error("No such file or directory: '{}'", path.display())]
    MissingTarget {
        /// The path as given.
        path: PathBuf,
    },
}

/// Exit code mapping for `ScanError` variants.
impl Classified for ScanError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::FindingsReported { .. } => ExitCode::FINDINGS,
            Self::EmptyPattern => ExitCode::INVALID_PATTERN,
            Self::MissingTarget { .. } => ExitCode::MISSING_TARGET,
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::FindingsReported { .. } => "findings_reported",
            Self::EmptyPattern => "invalid_pattern",
            Self::MissingTarget { .. } => "missing_target",
        }
    }
}

impl From<ScanError> for Failure {
    fn from(err: ScanError) -> Self {
        Self::classified(err)
    }
}
