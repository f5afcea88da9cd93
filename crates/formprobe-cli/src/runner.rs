//! Suite runner: one browser, one page per case, bounded concurrency

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use formprobe::{
    run_on_page, Browser, BrowserConfig, CaseResult, ScenarioCase, SuiteConfig, SuiteReport,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{error, info, warn};

/// Keep cases whose name contains `filter`, ignoring case
#[must_use]
pub fn filter_cases(cases: Vec<ScenarioCase>, filter: Option<&str>) -> Vec<ScenarioCase> {
    match filter {
        None => cases,
        Some(pattern) => {
            let pattern = pattern.to_lowercase();
            cases
                .into_iter()
                .filter(|c| c.name.to_lowercase().contains(&pattern))
                .collect()
        }
    }
}

/// Result of a case task; a panicked or cancelled task aborts its case
fn case_outcome(case: &ScenarioCase, joined: Result<CaseResult, JoinError>) -> CaseResult {
    joined.unwrap_or_else(|e| {
        error!(case = %case.name, error = %e, "case task failed");
        CaseResult::aborted(case, format!("case task failed: {e}"))
    })
}

/// Runs scenario cases against a real browser
#[derive(Debug)]
pub struct SuiteRunner {
    suite: Arc<SuiteConfig>,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a runner for a validated suite configuration
    #[must_use]
    pub fn new(suite: SuiteConfig, cli: &CliConfig) -> Self {
        let reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
        Self {
            suite: Arc::new(suite),
            reporter,
        }
    }

    /// Run every case, save the report and return it
    pub async fn run(&mut self, cases: Vec<ScenarioCase>) -> CliResult<SuiteReport> {
        let report = SuiteReport::begin(&self.suite);
        if cases.is_empty() {
            self.reporter.warning("No cases matched");
            return Ok(report.finish(Vec::new()));
        }

        let workers = self.suite.effective_workers(cases.len());
        self.reporter.header("Student registration form");
        self.reporter.info(&format!(
            "{} cases against {} with {workers} worker(s)",
            cases.len(),
            self.suite.form_url()
        ));
        self.reporter.start_progress(cases.len() as u64);

        let browser = match Browser::launch(BrowserConfig::from_suite(&self.suite)).await {
            Ok(browser) => Arc::new(browser),
            Err(e) => {
                self.reporter.finish();
                return Err(e.into());
            }
        };
        self.reporter.set_message("running");

        let permits = Arc::new(Semaphore::new(workers));
        let mut handles = Vec::with_capacity(cases.len());
        for case in cases {
            let browser = Arc::clone(&browser);
            let suite = Arc::clone(&self.suite);
            let permits = Arc::clone(&permits);
            let task_case = case.clone();
            let handle = tokio::spawn(async move {
                let case = task_case;
                let Ok(_permit) = permits.acquire_owned().await else {
                    return CaseResult::aborted(&case, "worker pool closed");
                };
                match browser.new_driver().await {
                    Ok(driver) => run_on_page(driver.as_ref(), &suite, case).await,
                    Err(e) => {
                        warn!(case = %case.name, error = %e, "could not open page");
                        CaseResult::aborted(&case, e.to_string())
                    }
                }
            });
            handles.push((case, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (case, handle) in handles {
            let result = case_outcome(&case, handle.await);
            self.reporter.case_finished(&result);
            results.push(result);
        }
        self.reporter.finish();

        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser did not close cleanly");
        }

        let report = report.finish(results);
        let path = report.save(&self.suite.output_dir)?;
        info!(path = %path.display(), "report written");
        self.reporter.summary(&report);
        self.reporter
            .info(&format!("Report written to {}", path.display()));
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use formprobe::{build_cases, TestDataProvider};

    fn cases() -> Vec<ScenarioCase> {
        build_cases(&SuiteConfig::default(), &TestDataProvider::default())
    }

    #[test]
    fn test_filter_none_keeps_all() {
        assert_eq!(filter_cases(cases(), None).len(), 4);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let kept = filter_cases(cases(), Some("REFERENCE"));
        assert_eq!(kept.len(), 1);
        assert!(kept[0].name.contains("reference data"));
        assert_eq!(filter_cases(cases(), Some("data set")).len(), 3);
        assert!(filter_cases(cases(), Some("nothing like this")).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_case_is_aborted_not_fatal() {
        let case = cases().remove(0);
        let handle = tokio::spawn(std::future::pending::<CaseResult>());
        handle.abort();
        let joined = handle.await;
        let result = case_outcome(&case, joined);
        assert!(!result.passed);
        assert_eq!(result.name, case.name);
        assert!(result.error.unwrap().contains("case task failed"));
    }

    #[tokio::test]
    async fn test_finished_case_passes_through() {
        let case = cases().remove(0);
        let expected = CaseResult::aborted(&case, "no page");
        let joined = tokio::spawn({
            let expected = expected.clone();
            async move { expected }
        })
        .await;
        assert_eq!(case_outcome(&case, joined), expected);
    }

    #[tokio::test]
    async fn test_empty_run_skips_browser() {
        let mut runner = SuiteRunner::new(
            SuiteConfig::default(),
            &CliConfig::new().with_verbosity(crate::Verbosity::Quiet),
        );
        let report = runner.run(Vec::new()).await.unwrap();
        assert_eq!(report.total(), 0);
    }
}
