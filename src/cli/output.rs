/// Output formatting: JSON, table, path modes. TTY detection.
use std::io::{IsTerminal, Write};

use comfy_table::{Cell, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use super::args::OutputFormat;
use crate::telemetry::TelemetryReport;
use crate::types::{ErrorOutput, MatchOutput};

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all formatters.
#[derive(Debug, Clone, Copy)]
pub struct OutputCtx {
    pub format: OutputFormat,
    pub no_header: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(fmt: OutputFormat, json_flag: bool, no_header: bool) -> Self {
        Self {
            format: resolve_format(fmt, json_flag),
            no_header,
        }
    }
}

// --- Scan matches ---

/// Write scan matches to stdout.
pub fn write_matches(matches: &[MatchOutput], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(matches),
        OutputFormat::Compact => print_compact_json(matches),
        OutputFormat::Ndjson => print_ndjson(matches),
        OutputFormat::Path => {
            let mut last: Option<&str> = None;
            for m in matches {
                if last != Some(m.path.as_str()) {
                    println!("{}", m.path);
                    last = Some(m.path.as_str());
                }
            }
        }
        OutputFormat::Table | OutputFormat::Auto => write_matches_table(matches, ctx),
    }
}

fn write_matches_table(matches: &[MatchOutput], ctx: &OutputCtx) {
    if matches.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if !ctx.no_header {
        table.set_header(["PATH", "LINE", "COL", "TEXT"]);
    }
    for m in matches {
        table.add_row([
            m.path.as_str(),
            &m.line.to_string(),
            &m.column.to_string(),
            m.text.as_str(),
        ]);
    }
    println!("{table}");
}

// --- Telemetry reports ---

/// Write recorded telemetry reports to stdout.
pub fn write_reports(reports: &[TelemetryReport], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(reports),
        OutputFormat::Compact => print_compact_json(reports),
        OutputFormat::Ndjson => print_ndjson(reports),
        OutputFormat::Path => {
            for r in reports {
                println!("{}", r.subcommand.as_deref().unwrap_or("-"));
            }
        }
        OutputFormat::Table | OutputFormat::Auto => write_reports_table(reports, ctx),
    }
}

fn write_reports_table(reports: &[TelemetryReport], ctx: &OutputCtx) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if !ctx.no_header {
        table.set_header(["STARTED", "SUBCOMMAND", "VERSION", "CODE", "DURATION"]);
    }
    for r in reports {
        table.add_row(vec![
            Cell::new(r.started_at.to_rfc3339()),
            Cell::new(r.subcommand.as_deref().unwrap_or("")),
            Cell::new(r.version.as_deref().unwrap_or("")),
            Cell::new(r.return_code.map(|c| c.to_string()).unwrap_or_default()),
            Cell::new(r.duration_ms.map(|ms| format!("{ms}ms")).unwrap_or_default()),
        ]);
    }
    println!("{table}");
}

// --- Error output ---

/// Write a structured error to stderr.
pub fn write_error(err: &ErrorOutput, format: OutputFormat) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    match format {
        OutputFormat::Json | OutputFormat::Compact | OutputFormat::Ndjson => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        _ => {
            let _ = writeln!(out, "Error: {}", err.error.message);
        }
    }
}

// --- Generic JSON helpers ---

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

fn print_compact_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

fn print_ndjson<T: Serialize>(values: &[T]) {
    for v in values {
        match serde_json::to_string(v) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("JSON serialization error: {e}"),
        }
    }
}
