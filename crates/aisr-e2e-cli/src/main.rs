//! AISR end-to-end CLI
//!
//! ## Usage
//!
//! ```bash
//! aisr-e2e run                          # Run every suite in headless chromium
//! aisr-e2e run --filter heading         # Only tests whose title matches
//! aisr-e2e run --driver mock            # Simulated site, no browser
//! aisr-e2e config --base-url http://localhost:4173
//! ```

use aisr_e2e::logging::{init_tracing, LogFormat};
use aisr_e2e_cli::{
    resolve_config, run_suites, Cli, CliConfig, CliError, CliResult, Commands, ConfigArgs,
    Reporter, RunArgs, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when some test failed
fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into());
    let _ = init_tracing(config.verbosity.log_directive(), LogFormat::Pretty);

    match cli.command {
        Commands::Run(ref args) => run_tests(&cli, config, args),
        Commands::Config(ref args) => {
            show_config(&cli, args)?;
            Ok(true)
        }
    }
}

fn run_tests(cli: &Cli, config: CliConfig, args: &RunArgs) -> CliResult<bool> {
    let e2e_config = resolve_config(cli.config.as_deref(), &args.overrides)?;
    if config.verbosity.is_verbose() {
        eprintln!(
            "Running against {} with {:?} driver",
            e2e_config.base_url, args.driver
        );
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::test_execution(format!("failed to start runtime: {e}")))?;
    let filter = args.filter.as_deref();
    let results = rt.block_on(run_suites(args.driver, e2e_config, filter))?;

    let reporter = Reporter::new(
        args.format.into(),
        config.color.should_color(),
        config.verbosity.is_quiet(),
    );
    println!("{}", reporter.render(&results)?);
    Ok(results.all_passed())
}

fn show_config(cli: &Cli, args: &ConfigArgs) -> CliResult<()> {
    let e2e_config = resolve_config(cli.config.as_deref(), &args.overrides)?;
    print!("{}", e2e_config.to_yaml()?);
    Ok(())
}
