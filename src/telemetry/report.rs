/// The per-run telemetry record and its JSON-lines storage format.
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::TelemetryError;
use crate::exit::ExitCode;

/// Everything recorded about one invocation.
///
/// `version` and `return_code` start out empty and must both be set before
/// the report is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryReport {
    pub version: Option<String>,
    pub return_code: Option<ExitCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommand: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub os: String,
    pub arch: String,
}

impl TelemetryReport {
    /// An empty report stamped with the current time and platform.
    #[must_use]
    pub fn begin() -> Self {
        Self {
            version: None,
            return_code: None,
            subcommand: None,
            started_at: Utc::now(),
            duration_ms: None,
            os: std::env::consts::OS.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
        }
    }

    /// Whether the mandatory fields are populated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.version.is_some() && self.return_code.is_some()
    }
}

/// Read every report from a JSON-lines metrics file. Blank lines are skipped.
///
/// # Errors
///
/// Returns `TelemetryError::Io` if the file cannot be read and
/// `TelemetryError::Malformed` for the first line that fails to parse.
pub fn read_reports(path: &Path) -> Result<Vec<TelemetryReport>, TelemetryError> {
    let content = fs::read_to_string(path).map_err(|source| TelemetryError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| TelemetryError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}
