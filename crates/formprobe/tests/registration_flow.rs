//! End-to-end registration scenarios against an in-memory DemoQA form.
//!
//! `FakeDemoQa` models the parts of the real page the suite depends on:
//! hidden radio and checkbox inputs behind styled labels, react-select
//! dropdowns that only render options while open, and a confirmation modal
//! whose table echoes what was entered.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use formprobe::model::cities_of;
use formprobe::{
    build_cases, run_registration, ElementState, FormFieldSet, PageDriver, ProbeError,
    ProbeResult, Selector, StudentRegistrationForm, SuiteConfig, SuiteReport, TestDataProvider,
};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

const DAY_PREFIX: &str = ".react-datepicker__day[aria-label*=\"";
const OPTION_PREFIX: &str = ".css-1n7v3ny-option:has-text(\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dropdown {
    State,
    City,
}

#[derive(Debug, Default)]
struct FormState {
    url: String,
    inputs: std::collections::HashMap<String, String>,
    focused: Option<String>,
    gender: Option<String>,
    month: Option<String>,
    year: Option<String>,
    day: Option<u32>,
    subjects: Vec<String>,
    hobbies: Vec<String>,
    files: Vec<String>,
    open: Option<Dropdown>,
    state: Option<String>,
    city: Option<String>,
    submitted: bool,
    modal_closed: bool,
}

#[derive(Debug, Default)]
struct FakeDemoQa {
    form: Mutex<FormState>,
    ignore_submit: bool,
}

impl FakeDemoQa {
    fn new() -> Self {
        Self::default()
    }

    fn ignoring_submit() -> Self {
        Self {
            ignore_submit: true,
            ..Self::default()
        }
    }

    fn options(form: &FormState, dropdown: Dropdown) -> Vec<&'static str> {
        match dropdown {
            Dropdown::State => formprobe::model::STATE_CITIES
                .iter()
                .map(|(s, _)| *s)
                .collect(),
            Dropdown::City => form
                .state
                .as_deref()
                .and_then(cities_of)
                .map(<[&str]>::to_vec)
                .unwrap_or_default(),
        }
    }

    fn lookup(&self, key: &str) -> Option<ElementState> {
        let form = self.form.lock().unwrap();
        let modal_open = form.submitted && !form.modal_closed;
        match key {
            "#firstName" | "#lastName" | "#userEmail" | "#userNumber" | "#currentAddress"
            | "#dateOfBirthInput" | "#subjectsInput" | "#state" | "#city" | "#submit" => {
                Some(ElementState::visible())
            }
            ".react-datepicker__month-select" | ".react-datepicker__year-select" => {
                Some(ElementState::visible().with_options(12))
            }
            "#uploadPicture" => Some(ElementState::visible().with_files(form.files.len())),
            ".modal-title" if modal_open => {
                Some(ElementState::visible().with_text("Thanks for submitting the form"))
            }
            ".modal-body" | "#closeLargeModal" if modal_open => Some(ElementState::visible()),
            k if k.starts_with("#gender-radio-") || k.starts_with("#hobbies-checkbox-") => {
                Some(ElementState::hidden())
            }
            k if k.starts_with("label[for=\"gender-radio-")
                || k.starts_with("label[for=\"hobbies-checkbox-") =>
            {
                Some(ElementState::visible())
            }
            k if k.starts_with(DAY_PREFIX) => {
                let (month, year) = (form.month.as_deref()?, form.year.as_deref()?);
                (k.contains(&format!("{month} ")) && k.contains(year))
                    .then(ElementState::visible)
            }
            k if k.starts_with(OPTION_PREFIX) => {
                let text = k.strip_prefix(OPTION_PREFIX)?.strip_suffix("\")")?;
                let open = form.open?;
                Self::options(&form, open)
                    .contains(&text)
                    .then(|| ElementState::visible().with_text(text))
            }
            _ => None,
        }
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let form = self.form.lock().unwrap();
        let input = |id: &str| form.inputs.get(id).cloned().unwrap_or_default();
        let dob = match (form.day, &form.month, &form.year) {
            (Some(d), Some(m), Some(y)) => format!("{d:02} {m},{y}"),
            _ => String::new(),
        };
        let state_city = match (&form.state, &form.city) {
            (Some(s), Some(c)) => format!("{s} {c}"),
            _ => String::new(),
        };
        [
            ("Label", "Values".to_string()),
            (
                "Student Name",
                format!("{} {}", input("#firstName"), input("#lastName")),
            ),
            ("Student Email", input("#userEmail")),
            ("Gender", form.gender.clone().unwrap_or_default()),
            ("Mobile", input("#userNumber")),
            ("Date of Birth", dob),
            ("Subjects", form.subjects.join(", ")),
            ("Hobbies", form.hobbies.join(", ")),
            ("Picture", form.files.join(", ")),
            ("Address", input("#currentAddress")),
            ("State and City", state_city),
        ]
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value])
        .collect()
    }

    fn activate(&self, key: &str) -> ProbeResult<()> {
        if self.lookup(key).is_none() {
            return Err(ProbeError::interaction(key, "element is not attached"));
        }
        let mut form = self.form.lock().unwrap();
        form.focused = Some(key.to_string());
        if let Some(id) = key
            .strip_prefix("label[for=\"")
            .and_then(|k| k.strip_suffix("\"]"))
        {
            let label = match id {
                "gender-radio-1" => "Male",
                "gender-radio-2" => "Female",
                "gender-radio-3" => "Other",
                "hobbies-checkbox-1" => "Sports",
                "hobbies-checkbox-2" => "Reading",
                "hobbies-checkbox-3" => "Music",
                _ => return Ok(()),
            };
            if id.starts_with("gender") {
                form.gender = Some(label.to_string());
            } else {
                form.hobbies.push(label.to_string());
            }
        } else if let Some(label) = key.strip_prefix(DAY_PREFIX) {
            form.day = label
                .split_whitespace()
                .nth(1)
                .and_then(|d| d.trim_end_matches(|c: char| !c.is_ascii_digit()).parse().ok());
        } else if let Some(text) = key.strip_prefix(OPTION_PREFIX) {
            let text = text.trim_end_matches("\")").to_string();
            match form.open.take() {
                Some(Dropdown::State) => {
                    form.state = Some(text);
                    form.city = None;
                }
                Some(Dropdown::City) => form.city = Some(text),
                None => {}
            }
        } else {
            match key {
                "#state" => form.open = Some(Dropdown::State),
                "#city" => form.open = Some(Dropdown::City),
                "#submit" if !self.ignore_submit => form.submitted = true,
                "#closeLargeModal" => form.modal_closed = true,
                _ => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for FakeDemoQa {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut form = self.form.lock().unwrap();
        *form = FormState {
            url: url.to_string(),
            ..FormState::default()
        };
        Ok(())
    }

    async fn ready_state(&self) -> ProbeResult<String> {
        Ok("complete".to_string())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.form.lock().unwrap().url.clone())
    }

    async fn element_state(&self, selector: &Selector) -> ProbeResult<Option<ElementState>> {
        Ok(self.lookup(&selector.to_string()))
    }

    async fn click(&self, selector: &Selector) -> ProbeResult<()> {
        self.activate(&selector.to_string())
    }

    async fn force_click(&self, selector: &Selector) -> ProbeResult<()> {
        self.activate(&selector.to_string())
    }

    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
        let key = selector.to_string();
        if self.lookup(&key).is_none() {
            return Err(ProbeError::interaction(key, "element is not attached"));
        }
        let mut form = self.form.lock().unwrap();
        form.focused = Some(key.clone());
        form.inputs.insert(key, text.to_string());
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, value: &str) -> ProbeResult<()> {
        let mut form = self.form.lock().unwrap();
        match selector.to_string().as_str() {
            ".react-datepicker__month-select" => form.month = Some(value.to_string()),
            ".react-datepicker__year-select" => form.year = Some(value.to_string()),
            other => return Err(ProbeError::interaction(other, "not a select")),
        }
        Ok(())
    }

    async fn focus(&self, selector: &Selector) -> ProbeResult<()> {
        self.form.lock().unwrap().focused = Some(selector.to_string());
        Ok(())
    }

    async fn press_key(&self, key: &str) -> ProbeResult<()> {
        let mut form = self.form.lock().unwrap();
        if key == "Enter" && form.focused.as_deref() == Some("#subjectsInput") {
            if let Some(subject) = form.inputs.remove("#subjectsInput") {
                form.subjects.push(subject);
            }
        }
        Ok(())
    }

    async fn type_keys(&self, _text: &str) -> ProbeResult<()> {
        Ok(())
    }

    async fn set_input_files(&self, _selector: &Selector, files: &[PathBuf]) -> ProbeResult<()> {
        self.form.lock().unwrap().files = files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        Ok(())
    }

    async fn table_rows(&self, container: &Selector) -> ProbeResult<Vec<Vec<String>>> {
        assert_eq!(container.to_string(), ".modal-body");
        Ok(self.rows())
    }

    async fn evaluate(&self, _script: &str) -> ProbeResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn close(&self) -> ProbeResult<()> {
        Ok(())
    }
}

fn suite_config(upload: &NamedTempFile) -> SuiteConfig {
    let mut config = SuiteConfig::default();
    config.upload_file = upload.path().to_path_buf();
    config
}

#[tokio::test(start_paused = true)]
async fn test_reference_case_round_trips_through_confirmation() {
    let upload = NamedTempFile::new().unwrap();
    let config = suite_config(&upload);
    let driver = FakeDemoQa::new();
    let form = StudentRegistrationForm::new(&driver, &config);
    let fields = FormFieldSet::reference_case();

    let snapshot = form.complete(&fields, upload.path()).await.unwrap();

    assert_eq!(snapshot.get("Student Name"), Some("John Doe"));
    assert_eq!(snapshot.get("Student Email"), Some("john.doe@example.com"));
    assert_eq!(snapshot.get("Mobile"), Some("1234567890"));
    assert_eq!(snapshot.get("Gender"), Some("Male"));
    assert_eq!(snapshot.get("Date of Birth"), Some("20 April,1990"));
    assert_eq!(snapshot.get("Subjects"), Some("Maths"));
    assert_eq!(snapshot.get("Hobbies"), Some("Sports, Reading"));
    assert_eq!(
        snapshot.get("Address"),
        Some("123 Test Street, Test City, 12345")
    );
    assert_eq!(snapshot.get("State and City"), Some("NCR Delhi"));
    assert!(driver.form.lock().unwrap().modal_closed);
}

#[tokio::test(start_paused = true)]
async fn test_harness_records_fallbacks() {
    let upload = NamedTempFile::new().unwrap();
    let config = suite_config(&upload);
    let driver = FakeDemoQa::new();
    let case = build_cases(&config, &TestDataProvider::default())
        .pop()
        .unwrap();

    let result = run_registration(&driver, &config, case).await;

    assert!(result.passed, "{:?}", result.error);
    assert_eq!(result.steps.len(), 13);
    assert!(result.steps.iter().all(|s| s.passed));
    // radios are hidden; the label strategy wins. Dropdowns skip data-value.
    let fallbacks: Vec<(&str, usize)> = result
        .fallbacks
        .iter()
        .map(|r| (r.target.as_str(), r.strategy_index))
        .collect();
    assert_eq!(
        fallbacks,
        vec![("gender Male", 5), ("state NCR", 1), ("city Delhi", 1)]
    );
    assert_eq!(result.fallbacks[0].failures.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_generated_cases_all_pass() {
    let upload = NamedTempFile::new().unwrap();
    let config = suite_config(&upload);
    let cases = build_cases(&config, &TestDataProvider::default());
    let report = SuiteReport::begin(&config);

    let mut results = Vec::new();
    for case in cases {
        let driver = FakeDemoQa::new();
        results.push(run_registration(&driver, &config, case).await);
    }
    let report = report.finish(results);

    assert_eq!(report.total(), 4);
    assert!(report.all_passed(), "{:?}", report.failures());
    for case in &report.cases {
        let snapshot = case.snapshot.as_ref().unwrap();
        assert!(!snapshot.get("Subjects").unwrap().is_empty());
        assert!(!snapshot.get("State and City").unwrap().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_modal_fails_at_confirmation() {
    let upload = NamedTempFile::new().unwrap();
    let mut config = suite_config(&upload);
    config.timeouts.element_ms = 500;
    let driver = FakeDemoQa::ignoring_submit();
    let case = build_cases(&config, &TestDataProvider::default())
        .pop()
        .unwrap();

    let result = run_registration(&driver, &config, case).await;

    assert!(!result.passed);
    let failed = result.failed_step().unwrap();
    assert_eq!(failed.name, "Wait for modal and validate title");
    assert!(failed.error.as_ref().unwrap().contains(".modal-title"));
    assert!(result.snapshot.is_none());
}
