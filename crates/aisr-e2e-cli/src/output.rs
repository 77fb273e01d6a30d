//! Report rendering

use crate::error::CliResult;
use aisr_e2e::{SuiteResults, TestResult};
use console::style;
use serde::{Deserialize, Serialize};

/// Output format for test results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Renders suite results for the terminal or for machines
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
}

impl Reporter {
    /// Create a reporter
    #[must_use]
    pub const fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            quiet,
        }
    }

    /// Render the full report
    pub fn render(&self, results: &SuiteResults) -> CliResult<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
            OutputFormat::Text => Ok(self.render_text(results)),
        }
    }

    fn render_text(&self, results: &SuiteResults) -> String {
        let mut out = String::new();
        if !self.quiet {
            out.push_str(&self.bold(&results.suite_name));
            out.push('\n');
        }
        for result in &results.results {
            if result.passed && self.quiet {
                continue;
            }
            out.push_str(&self.line(result));
            out.push('\n');
        }

        let summary = format!(
            "{} passed, {} failed ({}ms)",
            results.passed_count(),
            results.failed_count(),
            results.duration_ms
        );
        if self.use_color {
            let styled = if results.all_passed() {
                style(summary).green().bold()
            } else {
                style(summary).red().bold()
            };
            out.push_str(&styled.to_string());
        } else {
            out.push_str(&summary);
        }
        out
    }

    fn line(&self, result: &TestResult) -> String {
        let prefix = match (result.passed, self.use_color) {
            (true, true) => style("✓").green().bold().to_string(),
            (false, true) => style("✗").red().bold().to_string(),
            (true, false) => "PASS".to_string(),
            (false, false) => "FAIL".to_string(),
        };
        let line = format!("  {prefix} {} ({}ms)", result.name, result.duration_ms);
        match result.error {
            Some(ref error) if self.use_color => {
                format!("{line}\n      {}", style(error).dim())
            }
            Some(ref error) => format!("{line}\n      {error}"),
            None => line,
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }
}
