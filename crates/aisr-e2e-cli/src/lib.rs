//! AISR end-to-end CLI library
//!
//! Argument parsing, configuration layering, suite execution and report
//! rendering behind the `aisr-e2e` binary.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, DriverArg, FormatArg, OverrideArgs, RunArgs,
};
pub use config::{resolve_config, resolve_config_with, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, Reporter};
pub use runner::{launcher, run_suites};
