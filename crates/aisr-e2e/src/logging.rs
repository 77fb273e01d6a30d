//! Tracing subscriber setup shared by the CLI and ad-hoc test binaries.

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// Overrides `RUST_LOG` when set
pub const LOG_ENV: &str = "AISR_E2E_LOG";

/// Output format for log events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Build the filter: `AISR_E2E_LOG`, then `RUST_LOG`, then `default_directive`.
#[must_use]
pub fn env_filter(default_directive: &str) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive))
}

/// Install a global subscriber writing to stderr.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(default_directive: &str, format: LogFormat) -> bool {
    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_target(false)
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let _ = init_tracing("warn", LogFormat::Pretty);
        assert!(!init_tracing("warn", LogFormat::Json));
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&LogFormat::Json).unwrap_or_default();
        assert_eq!(json, "\"json\"");
    }
}
