//! Terminal output and progress reporting

use console::{style, Style, Term};
use formprobe::{CaseResult, SuiteReport};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for a suite run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` cases
    pub fn start_progress(&mut self, total: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message("launching browser");
        self.progress_bar = Some(pb);
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, message: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.println(message),
            None => {
                let _ = self.term.write_line(message);
            }
        }
    }

    fn prefix(&self, symbol: &'static str, plain: &'static str, style: &Style) -> String {
        if self.use_color {
            style.apply_to(symbol).bold().to_string()
        } else {
            plain.to_string()
        }
    }

    /// Report one finished case and advance the bar
    pub fn case_finished(&self, result: &CaseResult) {
        if result.passed {
            if !self.quiet {
                let prefix = self.prefix("✓", "PASS", &Style::new().green());
                self.line(&format!(
                    "{prefix} {} ({}ms)",
                    result.name, result.duration_ms
                ));
            }
        } else {
            // failures print even in quiet mode
            let prefix = self.prefix("✗", "FAIL", &Style::new().red());
            let step = result
                .failed_step()
                .map_or("setup", |s| s.name.as_str());
            self.line(&format!(
                "{prefix} {} at \"{step}\": {}",
                result.name,
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
        if !self.quiet {
            for fallback in &result.fallbacks {
                self.line(&format!(
                    "    {} resolved by strategy {} ({})",
                    fallback.target,
                    fallback.strategy_index + 1,
                    fallback.strategy
                ));
            }
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", &Style::new().yellow());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("ℹ", "INFO", &Style::new().blue());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the run summary
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        let secs = report.duration_ms() as f64 / 1000.0;
        let status = if failed > 0 { "FAILED" } else { "PASSED" };

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if failed > 0 {
                failed_style.apply_to(status)
            } else {
                passed_style.apply_to(status)
            };
            let _ = self.term.write_line(&format!(
                "{status} {} cases in {secs:.2}s ({} passed, {} failed)",
                report.total(),
                passed_style.apply_to(report.passed_count()),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            ));
        } else {
            let _ = self.term.write_line(&format!(
                "{status} {} cases in {secs:.2}s ({} passed, {failed} failed)",
                report.total(),
                report.passed_count(),
            ));
        }
    }
}

/// Render a saved report as plain text
#[must_use]
pub fn render_report(report: &SuiteReport) -> String {
    let mut out = format!(
        "Run {} ({} on {})\nStarted {}\n\n",
        report.run_id,
        report.form_url,
        report.browser,
        report.started_at.to_rfc3339()
    );
    for case in &report.cases {
        let status = if case.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!("{status} {} ({}ms)\n", case.name, case.duration_ms));
        for step in &case.steps {
            let mark = if step.passed { "ok" } else { "FAILED" };
            out.push_str(&format!("    {mark:<6} {} ({}ms)\n", step.name, step.duration_ms));
            if let Some(ref error) = step.error {
                out.push_str(&format!("           {error}\n"));
            }
        }
        if case.steps.is_empty() {
            if let Some(ref error) = case.error {
                out.push_str(&format!("    {error}\n"));
            }
        }
    }
    out.push_str(&format!("\n{report}\n"));
    out
}
