use std::io::{self, IsTerminal};
use std::sync::Once;

use clap::ValueEnum;
use tracing_subscriber::filter::{EnvFilter, FilterExt, FilterFn, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt};

use super::context::{TOOL_TARGET, ancestor_filter, is_tool_target};

static INIT: Once = Once::new();

/// Rendering of the tool's own log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    /// Plain text lines on stderr.
    #[default]
    Human,
    /// One JSON object per line on stderr.
    Json,
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level for the tool's own records when no directive is given.
    pub level: LevelFilter,
    /// Raw `EnvFilter` directive (from `CMDWRAP_LOG`); overrides `level`.
    pub directive: Option<String>,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            directive: None,
            format: LogFormat::Human,
        }
    }
}

impl LogConfig {
    /// Map `-q` / `-v` counts onto a level.
    #[must_use]
    pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    fn tool_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(format!("{TOOL_TARGET}={}", self.level));
        match &self.directive {
            Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
                eprintln!("Ignoring invalid log directive '{directive}': {err}");
                fallback()
            }),
            None => fallback(),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
///
/// - Tool layer: records under the `cmdwrap` target, stderr, level from config.
///   Errors always pass, whatever the directive says: with propagation off
///   nothing else would report a failed run.
/// - Ancestor layer: everything else at WARN; it sees tool records only while
///   propagation is enabled (see [`super::ancestor_filter`]).
pub fn init_logging(config: &LogConfig) {
    INIT.call_once(|| {
        let ansi = io::stderr().is_terminal();

        let tool_layer = match config.format {
            LogFormat::Human => fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(ansi)
                .with_target(false)
                .with_filter(config.tool_filter().or(LevelFilter::ERROR))
                .with_filter(FilterFn::new(|meta| is_tool_target(meta.target())))
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(io::stderr)
                .with_filter(config.tool_filter().or(LevelFilter::ERROR))
                .with_filter(FilterFn::new(|meta| is_tool_target(meta.target())))
                .boxed(),
        };

        let ancestor_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(ansi)
            .with_filter(LevelFilter::WARN)
            .with_filter(ancestor_filter());

        let _ = Registry::default()
            .with(tool_layer)
            .with(ancestor_layer)
            .try_init();
    });
}
