#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! cmdwrap — run CLI subcommands under a uniform exit-code and telemetry policy.
//!
//! Every subcommand body is handed to [`wrapper::command_wrapper`], which
//! detaches the tool's logs from ancestor loggers, runs the body, maps how it
//! ended to an [`exit::ExitCode`], flushes the [`telemetry`] report exactly
//! once and exits.

pub mod cli;
pub mod commands;
pub mod config;
pub mod exit;
pub mod logging;
pub mod scan;
pub mod telemetry;
pub mod types;
pub mod wrapper;
