//! Scenario harness: named, timed steps and the suite report.

use crate::config::SuiteConfig;
use crate::data::TestDataProvider;
use crate::driver::PageDriver;
use crate::form::StudentRegistrationForm;
use crate::model::{FormFieldSet, SubmittedDataSnapshot};
use crate::resolver::Resolution;
use crate::result::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Report file name inside the output directory
pub const REPORT_FILE: &str = "report.json";

/// Where a case's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CaseSource {
    /// Seeded data provider
    Generated {
        /// Seed the record was generated from
        seed: u64,
    },
    /// Fixed reference record
    Reference,
}

/// One scenario to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioCase {
    /// Case name
    pub name: String,
    /// Data origin
    pub source: CaseSource,
    /// Record to submit
    pub fields: FormFieldSet,
}

/// Generated cases followed by the reference case
#[must_use]
pub fn build_cases(config: &SuiteConfig, provider: &TestDataProvider) -> Vec<ScenarioCase> {
    let mut cases: Vec<ScenarioCase> = provider
        .generate_many(config.data_sets)
        .into_iter()
        .enumerate()
        .map(|(i, fields)| ScenarioCase {
            name: format!("Complete form submission with test data set {}", i + 1),
            source: CaseSource::Generated {
                seed: provider.base_seed().wrapping_add(i as u64),
            },
            fields,
        })
        .collect();
    cases.push(ScenarioCase {
        name: "Form submission with reference data (20 April 1990)".to_string(),
        source: CaseSource::Reference,
        fields: FormFieldSet::reference_case(),
    });
    cases
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step name
    pub name: String,
    /// Whether the step passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Step duration in milliseconds
    pub duration_ms: u64,
}

/// Outcome of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Case name
    pub name: String,
    /// Data origin
    pub source: CaseSource,
    /// Whether every step passed
    pub passed: bool,
    /// Steps in execution order; a failed step is the last one
    pub steps: Vec<StepResult>,
    /// Error message of the failing step
    pub error: Option<String>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Confirmation read back, when the case got that far
    pub snapshot: Option<SubmittedDataSnapshot>,
    /// Targets that needed a fallback strategy
    pub fallbacks: Vec<Resolution>,
}

impl CaseResult {
    /// Failed result for a case that never reached its first step
    #[must_use]
    pub fn aborted(case: &ScenarioCase, error: impl Into<String>) -> Self {
        Self {
            name: case.name.clone(),
            source: case.source,
            passed: false,
            steps: Vec::new(),
            error: Some(error.into()),
            duration_ms: 0,
            snapshot: None,
            fallbacks: Vec::new(),
        }
    }

    /// The step that failed
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.passed)
    }
}

/// Records named steps for one case
#[derive(Debug)]
pub struct CaseRecorder {
    case: ScenarioCase,
    steps: Vec<StepResult>,
    fallbacks: Vec<Resolution>,
    start: Instant,
}

impl CaseRecorder {
    /// Start recording a case
    #[must_use]
    pub fn new(case: ScenarioCase) -> Self {
        Self {
            case,
            steps: Vec::new(),
            fallbacks: Vec::new(),
            start: Instant::now(),
        }
    }

    /// Run one step inside its own span and record its outcome
    pub async fn step<T, F>(&mut self, name: &str, step: F) -> ProbeResult<T>
    where
        F: Future<Output = ProbeResult<T>>,
    {
        let span = info_span!("step", case = %self.case.name, step = name);
        let start = Instant::now();
        let result = step.instrument(span).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(case = %self.case.name, step = name, duration_ms, "step passed"),
            Err(e) => error!(case = %self.case.name, step = name, error = %e, "step failed"),
        }
        self.steps.push(StepResult {
            name: name.to_string(),
            passed: result.is_ok(),
            error: result.as_ref().err().map(ToString::to_string),
            duration_ms,
        });
        result
    }

    /// Keep a resolution that needed a fallback
    pub fn note(&mut self, resolution: Resolution) {
        if resolution.used_fallback() {
            self.fallbacks.push(resolution);
        }
    }

    /// Finish the case with its overall outcome
    #[must_use]
    pub fn finish(self, outcome: ProbeResult<SubmittedDataSnapshot>) -> CaseResult {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        let (passed, error, snapshot) = match outcome {
            Ok(snapshot) => (true, None, Some(snapshot)),
            Err(e) => (false, Some(e.to_string()), None),
        };
        CaseResult {
            name: self.case.name,
            source: self.case.source,
            passed,
            steps: self.steps,
            error,
            duration_ms,
            snapshot,
            fallbacks: self.fallbacks,
        }
    }
}

/// Drive one case through the registration form
pub async fn run_registration(
    driver: &dyn PageDriver,
    config: &SuiteConfig,
    case: ScenarioCase,
) -> CaseResult {
    let form = StudentRegistrationForm::new(driver, config);
    let fields = case.fields.clone();
    let mut rec = CaseRecorder::new(case);

    let outcome = async {
        rec.step("Navigate to form", form.navigate()).await?;
        rec.step("Fill personal information", form.fill_personal_info(&fields))
            .await?;
        if let Some(gender) = form.wants_gender(&fields) {
            let r = rec.step("Select gender", form.select_gender(gender)).await?;
            rec.note(r);
        }
        let r = rec
            .step("Set date of birth", form.set_date_of_birth(&fields.date_of_birth))
            .await?;
        rec.note(r);
        rec.step("Select subjects", form.select_subjects(&fields.subjects))
            .await?;
        for r in rec
            .step("Select hobbies", form.select_hobbies(&fields.hobbies))
            .await?
        {
            rec.note(r);
        }
        rec.step("Upload file", form.upload_file(&config.upload_file))
            .await?;
        rec.step("Fill address", form.fill_address(&fields.address))
            .await?;
        let (state, city) = rec
            .step(
                "Select state and city",
                form.select_state_and_city(&fields.state, &fields.city),
            )
            .await?;
        rec.note(state);
        rec.note(city);
        rec.step("Submit form", form.submit()).await?;
        rec.step("Wait for modal and validate title", async {
            form.wait_for_confirmation().await?;
            form.validate_title(None).await
        })
        .await?;
        let snapshot = rec
            .step("Validate submitted data", form.validate_submission(&fields))
            .await?;
        rec.step("Close modal", form.close_confirmation()).await?;
        Ok::<_, ProbeError>(snapshot)
    }
    .await;

    rec.finish(outcome)
}

/// Drive one case, then close its page whatever the outcome
pub async fn run_on_page(
    driver: &dyn PageDriver,
    config: &SuiteConfig,
    case: ScenarioCase,
) -> CaseResult {
    let name = case.name.clone();
    let result = run_registration(driver, config, case).await;
    if let Err(e) = driver.close().await {
        warn!(case = %name, error = %e, "page did not close cleanly");
    }
    result
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run id
    pub run_id: Uuid,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Browser engine
    pub browser: String,
    /// Form URL
    pub form_url: String,
    /// Case results in scheduling order
    pub cases: Vec<CaseResult>,
}

impl SuiteReport {
    /// Start an empty report for a run
    #[must_use]
    pub fn begin(config: &SuiteConfig) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            browser: config.browser.to_string(),
            form_url: config.form_url(),
            cases: Vec::new(),
        }
    }

    /// Close the report with its case results
    #[must_use]
    pub fn finish(mut self, cases: Vec<CaseResult>) -> Self {
        self.cases = cases;
        self.finished_at = Utc::now();
        self
    }

    /// Check if all cases passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(|c| c.passed)
    }

    /// Count passed cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.passed).count()
    }

    /// Count failed cases
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed).count()
    }

    /// Get total case count
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// Get failed cases
    #[must_use]
    pub fn failures(&self) -> Vec<&CaseResult> {
        self.cases.iter().filter(|c| !c.passed).collect()
    }

    /// Wall-clock duration in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Write `report.json` into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> ProbeResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }

    /// Read a report from a file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl std::fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} total in {}ms",
            self.passed_count(),
            self.failed_count(),
            self.total(),
            self.duration_ms()
        )
    }
}
