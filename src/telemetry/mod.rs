/// Telemetry: the per-run report and the manager that sends it once.
pub mod errors;
pub mod report;
pub mod sink;

use std::path::PathBuf;
use std::time::Instant;

use clap::ValueEnum;

pub use errors::{ReportError, TelemetryError};
pub use report::{TelemetryReport, read_reports};
pub use sink::ReportSink;

use crate::exit::ExitCode;

/// What the invocation wrapper needs from telemetry.
pub trait Telemetry {
    /// Tag the report with the tool version.
    fn set_version(&mut self, version: &str);

    /// Record the code the process is about to exit with.
    fn set_return_code(&mut self, code: ExitCode);

    /// Deliver the accumulated report.
    fn send(&mut self);
}

/// Whether reports are delivered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum MetricsState {
    /// Send only when a metrics file is configured.
    #[default]
    Auto,
    /// Always send; falls back to the log when no file is configured.
    On,
    /// Never send.
    Off,
}

/// Resolved telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSettings {
    pub state: MetricsState,
    pub file: Option<PathBuf>,
}

impl MetricsSettings {
    /// Settings that never deliver anything.
    #[must_use]
    pub fn off() -> Self {
        Self {
            state: MetricsState::Off,
            file: None,
        }
    }

    /// Whether a report would actually be delivered.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self.state {
            MetricsState::On => true,
            MetricsState::Off => false,
            MetricsState::Auto => self.file.is_some(),
        }
    }

    fn sink(&self) -> ReportSink {
        self.file
            .clone()
            .map_or(ReportSink::Log, ReportSink::JsonLines)
    }
}

/// Owns the report for one invocation and sends it at most once.
#[derive(Debug)]
pub struct MetricManager {
    settings: MetricsSettings,
    report: TelemetryReport,
    started: Instant,
    sent: bool,
}

impl MetricManager {
    #[must_use]
    pub fn new(settings: MetricsSettings) -> Self {
        Self {
            settings,
            report: TelemetryReport::begin(),
            started: Instant::now(),
            sent: false,
        }
    }

    /// A manager whose `send` delivers nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(MetricsSettings::off())
    }

    /// Name the subcommand this run executes.
    pub fn set_subcommand(&mut self, name: &str) {
        self.report.subcommand = Some(name.to_owned());
    }

    #[must_use]
    pub fn report(&self) -> &TelemetryReport {
        &self.report
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }
}

impl Telemetry for MetricManager {
    fn set_version(&mut self, version: &str) {
        self.report.version = Some(version.to_owned());
    }

    fn set_return_code(&mut self, code: ExitCode) {
        self.report.return_code = Some(code);
    }

    fn send(&mut self) {
        if self.sent {
            tracing::debug!("telemetry already sent for this run");
            return;
        }
        self.sent = true;

        if !self.settings.is_enabled() {
            tracing::debug!(state = ?self.settings.state, "metrics disabled, report dropped");
            return;
        }
        if !self.report.is_complete() {
            tracing::warn!("telemetry report is missing its version or return code, not sent");
            return;
        }

        let elapsed = self.started.elapsed().as_millis();
        self.report.duration_ms = Some(u64::try_from(elapsed).unwrap_or(u64::MAX));

        if let Err(err) = self.settings.sink().write(&self.report) {
            tracing::warn!("failed to send telemetry: {err}");
        }
    }
}
