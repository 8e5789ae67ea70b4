/// Run configuration: CLI flags layered over environment variables.
use std::path::PathBuf;

use clap::ValueEnum;
use thiserror::Error;

use crate::cli::Cli;
use crate::exit::{Classified, ExitCode, Failure};
use crate::logging::LogConfig;
use crate::telemetry::{MetricsSettings, MetricsState};

/// `EnvFilter` directive for the tool's log records; overrides `-v`/`-q`.
pub const ENV_LOG: &str = "CMDWRAP_LOG";
/// `on`, `off` or `auto`.
pub const ENV_METRICS: &str = "CMDWRAP_METRICS";
/// Path of the JSON-lines metrics file.
pub const ENV_METRICS_FILE: &str = "CMDWRAP_METRICS_FILE";

/// Configuration that could not be resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: expected one of on, off, auto")]
    InvalidValue { var: &'static str, value: String },
}

impl Classified for ConfigError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::INVALID_CONFIG
    }

    fn slug(&self) -> &'static str {
        "invalid_config"
    }
}

impl From<ConfigError> for Failure {
    fn from(err: ConfigError) -> Self {
        Self::classified(err)
    }
}

/// Everything a run needs beyond the parsed subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log: LogConfig,
    pub metrics: MetricsSettings,
}

impl Config {
    /// Resolve from CLI flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `CMDWRAP_METRICS` is not a known state.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let state = match (cli.metrics, lookup(ENV_METRICS)) {
            (Some(state), _) => state,
            (None, Some(value)) => MetricsState::from_str(value.trim(), true).map_err(|_| {
                ConfigError::InvalidValue {
                    var: ENV_METRICS,
                    value,
                }
            })?,
            (None, None) => MetricsState::default(),
        };
        let file = cli
            .metrics_file
            .clone()
            .or_else(|| lookup(ENV_METRICS_FILE).map(PathBuf::from));

        let log = LogConfig {
            level: LogConfig::level_for(cli.verbose, cli.quiet),
            directive: lookup(ENV_LOG),
            format: cli.log_format,
        };

        Ok(Self {
            log,
            metrics: MetricsSettings { state, file },
        })
    }
}
