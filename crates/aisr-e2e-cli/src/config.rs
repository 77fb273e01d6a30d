//! CLI configuration and layering of the harness configuration

use crate::commands::OverrideArgs;
use crate::error::CliResult;
use aisr_e2e::E2eConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures and summary only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Build from the `-q` flag and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default tracing directive for this level
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "aisr_e2e=info,warn",
            Self::Debug => "aisr_e2e=debug,info",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// CLI presentation settings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Resolve the harness configuration: defaults, then the YAML file, then
/// `AISR_E2E_*` environment variables, then command-line flags.
pub fn resolve_config(file: Option<&Path>, overrides: &OverrideArgs) -> CliResult<E2eConfig> {
    resolve_config_with(file, overrides, |key| std::env::var(key).ok())
}

/// Same as [`resolve_config`] with an explicit environment lookup
pub fn resolve_config_with<F>(
    file: Option<&Path>,
    overrides: &OverrideArgs,
    env: F,
) -> CliResult<E2eConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match file {
        Some(path) => E2eConfig::from_file(path)?,
        None => E2eConfig::new(),
    };
    let config = apply_overrides(config.apply_env_from(env)?, overrides);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(mut config: E2eConfig, overrides: &OverrideArgs) -> E2eConfig {
    if let Some(ref url) = overrides.base_url {
        config = config.with_base_url(url.clone());
    }
    if overrides.headed {
        config = config.with_headless(false);
    }
    if let Some(workers) = overrides.workers {
        config = config.with_workers(workers);
    }
    if let Some(ms) = overrides.timeout {
        config = config.with_test_timeout(ms);
    }
    if let Some(ms) = overrides.expect_timeout {
        config = config.with_expect_timeout(ms);
    }
    if let Some(ms) = overrides.navigation_timeout {
        config = config.with_navigation_timeout(ms);
    }
    if let Some(ref path) = overrides.chromium_path {
        config = config.with_chromium_path(path.clone());
    }
    if overrides.no_sandbox {
        config = config.with_no_sandbox();
    }
    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_is_verbose() {
            assert!(!Verbosity::Quiet.is_verbose());
            assert!(Verbosity::Quiet.is_quiet());
            assert!(Verbosity::Debug.is_verbose());
        }
    }

    mod layering_tests {
        use super::*;

        #[test]
        fn test_defaults_without_file() {
            let config = resolve_config_with(None, &OverrideArgs::default(), no_env).unwrap();
            assert_eq!(config.base_url, aisr_e2e::config::DEFAULT_BASE_URL);
        }

        #[test]
        fn test_file_then_env_then_flags() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("e2e.yaml");
            fs::write(
                &path,
                "base_url: http://file.test:1\nworkers: 2\ntest_timeout_ms: 1000\n",
            )
            .unwrap();

            let env = |key: &str| match key {
                "AISR_E2E_BASE_URL" => Some("http://env.test:2".to_string()),
                "AISR_E2E_WORKERS" => Some("4".to_string()),
                _ => None,
            };
            let overrides = OverrideArgs {
                workers: Some(8),
                headed: true,
                ..OverrideArgs::default()
            };

            let config = resolve_config_with(Some(&path), &overrides, env).unwrap();
            assert_eq!(config.base_url, "http://env.test:2");
            assert_eq!(config.workers, 8);
            assert_eq!(config.test_timeout_ms, 1000);
            assert!(!config.headless);
        }

        #[test]
        fn test_invalid_result_rejected() {
            let overrides = OverrideArgs {
                base_url: Some("not a url".to_string()),
                ..OverrideArgs::default()
            };
            let err = resolve_config_with(None, &overrides, no_env).unwrap_err();
            assert!(matches!(
                err,
                CliError::E2e(aisr_e2e::E2eError::Config { .. })
            ));
        }

        #[test]
        fn test_missing_file() {
            let err = resolve_config_with(
                Some(Path::new("/nonexistent/e2e.yaml")),
                &OverrideArgs::default(),
                no_env,
            )
            .unwrap_err();
            assert!(err.to_string().contains("e2e.yaml"));
        }
    }
}
