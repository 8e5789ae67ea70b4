/// Errors from writing and reading telemetry reports.
use std::path::PathBuf;

use thiserror::Error;

use crate::exit::{Classified, ExitCode, Failure};

/// Failures of the report sinks and of the report reader.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("cannot access metrics file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode telemetry report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("malformed report on line {line} of '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Expected failures of the `report` subcommand.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Neither `--metrics-file` nor `CMDWRAP_METRICS_FILE` is set.
    #[error("No metrics file configured; pass --metrics-file or set CMDWRAP_METRICS_FILE")]
    NoMetricsFile,

    /// The configured metrics file has not been written yet.
    #[error("Metrics file '{}' does not exist", path.display())]
    MissingFile { path: PathBuf },
}

impl Classified for ReportError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoMetricsFile => ExitCode::INVALID_CONFIG,
            Self::MissingFile { .. } => ExitCode::MISSING_TARGET,
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::NoMetricsFile => "no_metrics_file",
            Self::MissingFile { .. } => "missing_target",
        }
    }
}

impl From<ReportError> for Failure {
    fn from(err: ReportError) -> Self {
        Self::classified(err)
    }
}

impl From<TelemetryError> for Failure {
    fn from(err: TelemetryError) -> Self {
        Self::Unclassified(err.into())
    }
}
