//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Run the AISR browser end-to-end suites
#[derive(Parser, Debug)]
#[command(name = "aisr-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and the summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the end-to-end suites
    Run(RunArgs),

    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

/// Settings that override the configuration file and environment
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Base URL of the application under test
    #[arg(long)]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Maximum concurrent test cases (0 = number of CPUs)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Per-test timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Assertion timeout in milliseconds
    #[arg(long)]
    pub expect_timeout: Option<u64>,

    /// Navigation timeout in milliseconds
    #[arg(long)]
    pub navigation_timeout: Option<u64>,

    /// Path to the chromium executable
    #[arg(long)]
    pub chromium_path: Option<String>,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only run tests whose title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Browser driver
    #[arg(long, default_value = "chromium")]
    pub driver: DriverArg,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,

    /// Configuration overrides
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration overrides
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Browser driver choice
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverArg {
    /// Real chromium over CDP
    #[default]
    Chromium,
    /// Simulated AISR site, no browser needed
    Mock,
}

/// Report format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["aisr-e2e", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.driver, DriverArg::Chromium);
        assert_eq!(args.format, FormatArg::Text);
        assert!(args.filter.is_none());
        assert!(!args.overrides.headed);
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "aisr-e2e",
            "-vv",
            "run",
            "--driver",
            "mock",
            "--base-url",
            "http://127.0.0.1:4000",
            "-j",
            "3",
            "--timeout",
            "500",
            "--format",
            "json",
            "--filter",
            "heading",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.driver, DriverArg::Mock);
        assert_eq!(args.format, FormatArg::Json);
        assert_eq!(args.filter.as_deref(), Some("heading"));
        assert_eq!(
            args.overrides.base_url.as_deref(),
            Some("http://127.0.0.1:4000")
        );
        assert_eq!(args.overrides.workers, Some(3));
        assert_eq!(args.overrides.timeout, Some(500));
    }

    #[test]
    fn test_unknown_driver_rejected() {
        let parsed = Cli::try_parse_from(["aisr-e2e", "run", "--driver", "firefox"]);
        assert!(parsed.is_err());
    }
}
