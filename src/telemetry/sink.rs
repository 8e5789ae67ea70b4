/// Destinations a finished report can be sent to.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::TelemetryError;
use super::report::TelemetryReport;

/// Where [`super::MetricManager::send`] delivers the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSink {
    /// Emit the report as an info event under `cmdwrap::telemetry`.
    Log,
    /// Append one JSON object per line to a file.
    JsonLines(PathBuf),
}

impl ReportSink {
    /// Deliver one report.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError` if the report cannot be encoded or the file
    /// cannot be opened or appended to.
    pub fn write(&self, report: &TelemetryReport) -> Result<(), TelemetryError> {
        let line = serde_json::to_string(report)?;
        match self {
            Self::Log => {
                tracing::info!(target: "cmdwrap::telemetry", report = %line, "telemetry report");
                Ok(())
            }
            Self::JsonLines(path) => append_line(path, &line),
        }
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), TelemetryError> {
    let io_err = |source| TelemetryError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    writeln!(file, "{line}").map_err(io_err)
}
