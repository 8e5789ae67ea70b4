#![deny(clippy::all, clippy::pedantic)]
//! cmdwrap binary entry point.

use clap::Parser;

use cmdwrap::cli::{Cli, OutputCtx};
use cmdwrap::config::Config;
use cmdwrap::exit::Failure;
use cmdwrap::logging::{LogConfig, LogContext, init_logging};
use cmdwrap::telemetry::MetricManager;
use cmdwrap::{commands, wrapper};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let cli = Cli::parse();

    let ctx = OutputCtx::new(cli.output, cli.json, cli.no_header);
    let log = LogContext::new(ctx.format);

    match Config::from_cli(&cli) {
        Ok(config) => {
            init_logging(&config.log);
            let mut telemetry = MetricManager::new(config.metrics.clone());
            telemetry.set_subcommand(cli.command.name());
            wrapper::command_wrapper(&log, &mut telemetry, VERSION, || {
                commands::dispatch(&cli.command, &ctx, &config)
            })
        }
        // Bad configuration still goes through the wrapper so it gets a
        // classified exit code and a (disabled) flush like any other run.
        Err(err) => {
            init_logging(&LogConfig::default());
            let mut telemetry = MetricManager::disabled();
            telemetry.set_subcommand(cli.command.name());
            wrapper::command_wrapper(&log, &mut telemetry, VERSION, || {
                Err(Failure::from(err))
            })
        }
    }
}
