/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::logging::LogFormat;
use crate::telemetry::MetricsState;

/// cmdwrap — run subcommands under a uniform exit-code and telemetry policy.
#[derive(Debug, Parser)]
#[command(
    name = "cmdwrap",
    about = "Search files for a pattern, with exit codes and telemetry you can rely on",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output format. Auto-detects: table when TTY, json when piped.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "auto")]
    pub output: OutputFormat,

    /// Shorthand for --output json.
    #[arg(long, global = true, conflicts_with = "output")]
    pub json: bool,

    /// Omit table headers.
    #[arg(long, global = true)]
    pub no_header: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Format of log records written to stderr.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "human")]
    pub log_format: LogFormat,

    /// Whether to record a telemetry report for this run [env: CMDWRAP_METRICS].
    #[arg(long, global = true, value_name = "STATE")]
    pub metrics: Option<MetricsState>,

    /// JSON-lines file telemetry reports are appended to [env: CMDWRAP_METRICS_FILE].
    #[arg(long, global = true, value_name = "PATH")]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: table when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// JSON array or object (pretty-printed).
    Json,
    /// Compact single-line JSON.
    Compact,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
    /// Aligned table with headers (human-readable).
    Table,
    /// Paths only, one per line.
    Path,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search files for a literal pattern. Exits 1 when anything matches.
    Scan(ScanArgs),
    /// Show telemetry reports recorded in the metrics file.
    Report(ReportArgs),
    /// Fail on purpose with an unexpected error.
    #[command(hide = true)]
    Crash(CrashArgs),
}

impl Command {
    /// Stable name recorded in telemetry.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scan(_) => "scan",
            Self::Report(_) => "report",
            Self::Crash(_) => "crash",
        }
    }
}

/// Arguments for `cmdwrap scan`.
#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// Literal text to look for.
    pub pattern: String,

    /// Files or directories to search. Directories are walked recursively.
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Match case-insensitively.
    #[arg(short = 'i', long)]
    pub ignore_case: bool,
}

/// Arguments for `cmdwrap report`.
#[derive(Debug, Parser)]
pub struct ReportArgs {
    /// Show only the N most recent reports.
    #[arg(long, value_name = "N")]
    pub last: Option<usize>,
}

/// Arguments for `cmdwrap crash`.
#[derive(Debug, Parser)]
pub struct CrashArgs {
    /// How to fail.
    #[arg(long, default_value = "error")]
    pub mode: CrashMode,
}

/// Ways `crash` can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CrashMode {
    /// Return an error that carries no exit code.
    Error,
    /// Panic.
    Panic,
}
