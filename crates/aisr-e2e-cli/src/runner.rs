//! Suite execution for the `run` command

use crate::commands::DriverArg;
use crate::error::CliResult;
use aisr_e2e::{
    launch_chromium, suites, BrowserLauncher, E2eConfig, MockBrowser, SuiteResults, TestRunner,
};
use std::sync::Arc;

/// Launch the selected browser
pub async fn launcher(
    driver: DriverArg,
    config: &E2eConfig,
) -> CliResult<Arc<dyn BrowserLauncher>> {
    match driver {
        DriverArg::Mock => Ok(Arc::new(MockBrowser::aisr())),
        DriverArg::Chromium => Ok(launch_chromium(config).await?),
    }
}

/// Run the AISR suites and shut the browser down
pub async fn run_suites(
    driver: DriverArg,
    config: E2eConfig,
    filter: Option<&str>,
) -> CliResult<SuiteResults> {
    let browser = launcher(driver, &config).await?;
    let runner = TestRunner::new(config, Arc::clone(&browser));
    let results = runner.run(&suites::home_suite(), filter).await;
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "failed to close browser");
    }
    Ok(results)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_run_passes() {
        let config = E2eConfig::new().with_expect_timeout(100);
        let results = run_suites(DriverArg::Mock, config, None).await.unwrap();
        assert_eq!(results.total(), 2);
        assert!(results.all_passed());
    }

    #[tokio::test]
    async fn test_filter_matching_nothing() {
        let results = run_suites(DriverArg::Mock, E2eConfig::new(), Some("no such test"))
            .await
            .unwrap();
        assert_eq!(results.total(), 0);
    }
}
