//! Student registration form page object.
//!
//! One operation per form step. Each step is a straight sequence of waits and
//! resolver calls; the only branching is the fallback ordering inside each
//! [`LogicalTarget`].

use crate::config::{ms, SuiteConfig};
use crate::driver::{missing_files, PageDriver};
use crate::locator::Selector;
use crate::model::{DateOfBirth, FormFieldSet, Gender, Hobby, SubmittedDataSnapshot};
use crate::page_object::PageObject;
use crate::resolver::{KeyInput, LogicalTarget, Resolution, Resolver, Strategy};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{UrlPattern, WaitPolicy};
use std::path::Path;
use tracing::{debug, info, warn};

/// Title of the confirmation modal after a successful submission
pub const DEFAULT_CONFIRMATION_TITLE: &str = "Thanks for submitting the form";

/// Form selectors
pub mod selectors {
    /// First name input
    pub const FIRST_NAME: &str = "#firstName";
    /// Last name input
    pub const LAST_NAME: &str = "#lastName";
    /// Email input
    pub const EMAIL: &str = "#userEmail";
    /// Mobile input
    pub const PHONE: &str = "#userNumber";
    /// Date of birth input (opens the date picker)
    pub const DATE_OF_BIRTH: &str = "#dateOfBirthInput";
    /// Subjects autocomplete input
    pub const SUBJECTS: &str = "#subjectsInput";
    /// Picture file input
    pub const UPLOAD: &str = "#uploadPicture";
    /// Current address textarea
    pub const ADDRESS: &str = "#currentAddress";
    /// State dropdown
    pub const STATE: &str = "#state";
    /// City dropdown
    pub const CITY: &str = "#city";
    /// Submit button
    pub const SUBMIT: &str = "#submit";
    /// Date picker month select
    pub const MONTH_SELECT: &str = ".react-datepicker__month-select";
    /// Date picker year select
    pub const YEAR_SELECT: &str = ".react-datepicker__year-select";
    /// Date picker day cell
    pub const DAY: &str = ".react-datepicker__day";
    /// Day cells of the displayed month only
    pub const DAY_IN_MONTH: &str =
        ".react-datepicker__day:not(.react-datepicker__day--outside-month)";
    /// Dropdown option class emitted by react-select
    pub const DROPDOWN_OPTION: &str = ".css-1n7v3ny-option";
    /// Confirmation modal title
    pub const MODAL_TITLE: &str = ".modal-title";
    /// Confirmation modal body holding the result table
    pub const MODAL_BODY: &str = ".modal-body";
    /// Confirmation modal close button
    pub const MODAL_CLOSE: &str = "#closeLargeModal";
}

/// Ads and banners that overlap the form
const OVERLAYS: [&str; 6] = [
    "#fixedban",
    "footer",
    "#adplus-anchor",
    "iframe[id^=\"google_ads\"]",
    "[id^=\"google_ads_iframe\"]",
    ".Advertisement-Section",
];

/// English ordinal suffix for a day of month
fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Strategies for a gender radio, most specific first
pub fn gender_target(gender: Gender) -> ProbeResult<LogicalTarget> {
    let g = gender.as_str();
    LogicalTarget::new(
        format!("gender {g}"),
        vec![
            Strategy::click(Selector::css(format!("#{}", gender.radio_id()))),
            Strategy::click(Selector::css(format!("input[value=\"{g}\"]"))),
            Strategy::click(Selector::css(format!(
                "input[name=\"gender\"][value=\"{g}\"]"
            ))),
            Strategy::click(Selector::in_label(g, "input[type=\"radio\"]")),
            Strategy::click(Selector::css(format!(
                "input[type=\"radio\"][value=\"{g}\"]"
            ))),
            Strategy::click(Selector::css(format!(
                "label[for=\"{}\"]",
                gender.radio_id()
            ))),
            Strategy::click(Selector::text(g)),
        ],
    )
}

/// Strategies for a date-picker day, after month and year are selected
pub fn day_target(dob: &DateOfBirth) -> ProbeResult<LogicalTarget> {
    let (day, month, year) = (dob.day, dob.month.as_str(), dob.year);
    let aria = |label: String| {
        Strategy::click(Selector::css(format!(
            "{}[aria-label*=\"{label}\"]",
            selectors::DAY
        )))
    };
    LogicalTarget::new(
        format!("day {dob}"),
        vec![
            aria(format!("{month} {}, {year}", ordinal(day))),
            aria(format!("{month} {day}, {year}")),
            aria(format!("{} {day}, {year}", dob.month_abbrev())),
            Strategy::click(Selector::css_exact_text(
                selectors::DAY_IN_MONTH,
                day.to_string(),
            )),
            Strategy::click(Selector::css_with_text(
                selectors::DAY_IN_MONTH,
                day.to_string(),
            )),
            Strategy::keyboard(
                None,
                vec![
                    KeyInput::press("Tab"),
                    KeyInput::text(day.to_string()),
                    KeyInput::press("Enter"),
                ],
            ),
        ],
    )
}

/// Strategies for a hobby checkbox hidden behind its styled label
pub fn hobby_target(hobby: Hobby) -> ProbeResult<LogicalTarget> {
    let id = hobby.checkbox_id();
    LogicalTarget::new(
        format!("hobby {hobby}"),
        vec![
            Strategy::click(Selector::css(format!("label[for=\"{id}\"]"))),
            Strategy::force_click(Selector::css(format!("#{id}"))),
            Strategy::click(Selector::text(hobby.as_str())),
            Strategy::keyboard(
                Some(Selector::css(format!("#{id}"))),
                vec![KeyInput::press("Space")],
            ),
        ],
    )
}

/// Strategies for an option of an open react-select dropdown.
///
/// `select_index` is the react-select instance number used in option ids.
pub fn dropdown_option_target(
    dropdown: &str,
    select_index: u32,
    value: &str,
) -> ProbeResult<LogicalTarget> {
    LogicalTarget::new(
        format!("{} {value}", dropdown.trim_start_matches('#')),
        vec![
            Strategy::click(Selector::css(format!("[data-value=\"{value}\"]"))),
            Strategy::click(Selector::css_with_text(selectors::DROPDOWN_OPTION, value)),
            Strategy::click(Selector::css_with_text(
                format!("[id^=\"react-select-{select_index}-option\"]"),
                value,
            )),
            Strategy::click(Selector::text(value)),
            Strategy::keyboard(
                None,
                vec![KeyInput::text(value), KeyInput::press("Enter")],
            ),
        ],
    )
}

/// The DemoQA student registration form
pub struct StudentRegistrationForm<'d> {
    driver: &'d dyn PageDriver,
    config: &'d SuiteConfig,
    wait: WaitPolicy<'d>,
}

impl std::fmt::Debug for StudentRegistrationForm<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentRegistrationForm")
            .field("url", &self.config.form_url())
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl<'d> StudentRegistrationForm<'d> {
    /// Wrap a page
    #[must_use]
    pub fn new(driver: &'d dyn PageDriver, config: &'d SuiteConfig) -> Self {
        Self {
            driver,
            config,
            wait: WaitPolicy::new(driver).with_poll_interval(config.poll_interval()),
        }
    }

    /// Wait policy bound to this page
    #[must_use]
    pub const fn wait(&self) -> &WaitPolicy<'d> {
        &self.wait
    }

    fn element_timeout(&self) -> std::time::Duration {
        ms(self.config.timeouts.element_ms)
    }

    fn resolver(&self, strategy_timeout_ms: u64) -> Resolver {
        Resolver::new(ms(strategy_timeout_ms)).with_poll_interval(self.config.poll_interval())
    }

    async fn visible(&self, css: &str) -> ProbeResult<Selector> {
        let selector = Selector::css(css);
        let _ = self
            .wait
            .element_visible(&selector, self.element_timeout())
            .await?;
        Ok(selector)
    }

    /// Open the form, wait for it, strip overlays, then best-effort idle
    pub async fn navigate(&self) -> ProbeResult<()> {
        let url = self.config.form_url();
        let budget_ms = self.load_timeout_ms();
        let timeout = ms(budget_ms);
        let started = tokio::time::Instant::now();
        info!(%url, "navigating to form");

        tokio::time::timeout(timeout, self.driver.navigate(&url))
            .await
            .map_err(|_| ProbeError::WaitTimeout {
                target: url.clone(),
                condition: "navigated".to_string(),
                ms: budget_ms,
            })??;
        // commit and DOM parse share one navigation budget
        let _ = self
            .wait
            .dom_ready(timeout.saturating_sub(started.elapsed()))
            .await?;
        let _ = self.visible(selectors::FIRST_NAME).await?;
        if !self.is_loaded(self.driver).await? {
            let landed = self.driver.current_url().await?;
            return Err(ProbeError::NavigationError {
                url,
                message: format!("landed on {landed} instead of the {}", self.page_name()),
            });
        }

        let removed = self.clean_page().await;
        debug!(removed, "overlays removed");

        let idle = self
            .wait
            .network_idle(
                ms(self.config.timeouts.network_idle_ms),
                ms(self.config.settle.network_idle_ms),
            )
            .await;
        let _ = WaitPolicy::best_effort(idle)?;
        Ok(())
    }

    /// Remove ads and fixed banners that intercept clicks.
    ///
    /// Returns how many nodes were removed; a failing script removes nothing.
    pub async fn clean_page(&self) -> u64 {
        let list = serde_json::to_string(&OVERLAYS).unwrap_or_else(|_| "[]".to_string());
        let script = format!(
            "(() => {{ let n = 0; for (const s of {list}) {{ \
               document.querySelectorAll(s).forEach(el => {{ el.remove(); n++; }}); \
             }} return n; }})()"
        );
        match self.driver.evaluate(&script).await {
            Ok(value) => value.as_u64().unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "overlay cleanup failed, continuing");
                0
            }
        }
    }

    /// Fill first name, last name, email and mobile
    pub async fn fill_personal_info(&self, fields: &FormFieldSet) -> ProbeResult<()> {
        let first = self.visible(selectors::FIRST_NAME).await?;
        self.driver.fill(&first, &fields.first_name).await?;
        self.driver
            .fill(&Selector::css(selectors::LAST_NAME), &fields.last_name)
            .await?;
        self.driver
            .fill(&Selector::css(selectors::EMAIL), &fields.email)
            .await?;
        self.driver
            .fill(&Selector::css(selectors::PHONE), &fields.phone)
            .await
    }

    /// Pick a gender radio
    pub async fn select_gender(&self, gender: Gender) -> ProbeResult<Resolution> {
        let target = gender_target(gender)?;
        self.resolver(self.config.timeouts.gender_strategy_ms)
            .resolve(self.driver, &target)
            .await
    }

    /// Open the date picker, choose month and year, then the day
    pub async fn set_date_of_birth(&self, dob: &DateOfBirth) -> ProbeResult<Resolution> {
        // rejects unknown months before touching the page
        let _ = dob.month_index()?;
        let input = self.visible(selectors::DATE_OF_BIRTH).await?;
        self.driver.click(&input).await?;

        let month = self.visible(selectors::MONTH_SELECT).await?;
        self.driver.select_option(&month, &dob.month).await?;
        self.driver
            .select_option(&Selector::css(selectors::YEAR_SELECT), &dob.year.to_string())
            .await?;
        self.wait.settle(ms(self.config.settle.calendar_ms)).await;

        let resolution = self
            .resolver(self.config.timeouts.day_strategy_ms)
            .resolve(self.driver, &day_target(dob)?)
            .await?;

        if let Ok(Some(state)) = self.driver.element_state(&input).await {
            debug!(value = ?state.value, "date input after selection");
        }
        Ok(resolution)
    }

    /// Type each subject into the autocomplete and confirm with Enter
    pub async fn select_subjects(&self, subjects: &[String]) -> ProbeResult<()> {
        for subject in subjects {
            let input = self.visible(selectors::SUBJECTS).await?;
            self.driver.click(&input).await?;
            self.driver.fill(&input, subject).await?;
            self.driver.press_key("Enter").await?;
        }
        Ok(())
    }

    /// Tick each hobby checkbox
    pub async fn select_hobbies(&self, hobbies: &[Hobby]) -> ProbeResult<Vec<Resolution>> {
        let resolver = self.resolver(self.config.timeouts.hobby_strategy_ms);
        let mut resolutions = Vec::with_capacity(hobbies.len());
        for hobby in hobbies {
            let checkbox = Selector::css(format!("#{}", hobby.checkbox_id()));
            let _ = self
                .wait
                .element_attached(&checkbox, self.element_timeout())
                .await?;
            resolutions.push(resolver.resolve(self.driver, &hobby_target(*hobby)?).await?);
        }
        Ok(resolutions)
    }

    /// Attach a local file to the picture input
    pub async fn upload_file(&self, path: &Path) -> ProbeResult<()> {
        let files = vec![path.to_path_buf()];
        if let Some(missing) = missing_files(&files).first() {
            return Err(ProbeError::invalid_data(format!(
                "upload file not found: {}",
                missing.display()
            )));
        }
        let input = self.visible(selectors::UPLOAD).await?;
        self.driver.set_input_files(&input, &files).await?;
        let _ = self
            .wait
            .file_input_has_files(&input, self.element_timeout())
            .await?;
        Ok(())
    }

    /// Fill the current address
    pub async fn fill_address(&self, address: &str) -> ProbeResult<()> {
        let input = self.visible(selectors::ADDRESS).await?;
        self.driver.fill(&input, address).await
    }

    async fn select_dropdown(
        &self,
        dropdown: &str,
        select_index: u32,
        value: &str,
    ) -> ProbeResult<Resolution> {
        let control = self.visible(dropdown).await?;
        self.driver.click(&control).await?;
        self.wait
            .settle(ms(self.config.settle.dropdown_open_ms))
            .await;
        self.resolver(self.config.timeouts.dropdown_strategy_ms)
            .resolve(
                self.driver,
                &dropdown_option_target(dropdown, select_index, value)?,
            )
            .await
    }

    /// Choose the state, then a city of that state
    pub async fn select_state_and_city(
        &self,
        state: &str,
        city: &str,
    ) -> ProbeResult<(Resolution, Resolution)> {
        let state_res = self.select_dropdown(selectors::STATE, 3, state).await?;
        self.wait.settle(ms(self.config.settle.after_state_ms)).await;
        let city_res = self.select_dropdown(selectors::CITY, 4, city).await?;
        Ok((state_res, city_res))
    }

    /// Submit once the button is actionable
    pub async fn submit(&self) -> ProbeResult<()> {
        let button = Selector::css(selectors::SUBMIT);
        let _ = self
            .wait
            .element_enabled(&button, self.element_timeout())
            .await?;
        self.driver.click(&button).await
    }

    /// Wait for the confirmation modal to appear and settle
    pub async fn wait_for_confirmation(&self) -> ProbeResult<()> {
        let _ = self
            .wait
            .modal(
                &Selector::css(selectors::MODAL_TITLE),
                self.element_timeout(),
                ms(self.config.settle.modal_ms),
            )
            .await?;
        Ok(())
    }

    /// Confirmation modal title text
    pub async fn confirmation_title(&self) -> ProbeResult<String> {
        let title = Selector::css(selectors::MODAL_TITLE);
        self.driver
            .element_state(&title)
            .await?
            .map(|s| s.text.trim().to_string())
            .ok_or_else(|| ProbeError::interaction(title.to_string(), "modal title is not attached"))
    }

    /// Parse the confirmation table
    pub async fn read_confirmation(&self) -> ProbeResult<SubmittedDataSnapshot> {
        let body = self.visible(selectors::MODAL_BODY).await?;
        self.wait.settle(ms(self.config.settle.modal_ms)).await;
        let rows = self.driver.table_rows(&body).await?;
        Ok(SubmittedDataSnapshot::from_rows(&rows))
    }

    /// Check the modal title; `None` expects the default title
    pub async fn validate_title(&self, expected: Option<&str>) -> ProbeResult<()> {
        let expected = expected.unwrap_or(DEFAULT_CONFIRMATION_TITLE);
        let actual = self.confirmation_title().await?;
        if actual == expected {
            Ok(())
        } else {
            Err(ProbeError::AssertionMismatch {
                field: "modal title".to_string(),
                expected: expected.to_string(),
                actual,
            })
        }
    }

    /// Read back the confirmation and compare it with the submitted record
    pub async fn validate_submission(
        &self,
        expected: &FormFieldSet,
    ) -> ProbeResult<SubmittedDataSnapshot> {
        let snapshot = self.read_confirmation().await?;
        for (label, value) in snapshot.iter() {
            debug!(label, value, "submitted");
        }
        snapshot.verify(expected)?;
        Ok(snapshot)
    }

    /// Dismiss the confirmation modal
    pub async fn close_confirmation(&self) -> ProbeResult<()> {
        let close = Selector::css(selectors::MODAL_CLOSE);
        let _ = self
            .wait
            .element_enabled(&close, self.element_timeout())
            .await?;
        self.driver.click(&close).await
    }

    /// Whether the gender step runs for this record
    #[must_use]
    pub fn wants_gender(&self, fields: &FormFieldSet) -> Option<Gender> {
        fields.gender.filter(|_| self.config.select_gender)
    }

    /// Run the whole scenario for one record and return the confirmation
    pub async fn complete(
        &self,
        fields: &FormFieldSet,
        upload: &Path,
    ) -> ProbeResult<SubmittedDataSnapshot> {
        self.navigate().await?;
        self.fill_personal_info(fields).await?;
        if let Some(gender) = self.wants_gender(fields) {
            let _ = self.select_gender(gender).await?;
        }
        let _ = self.set_date_of_birth(&fields.date_of_birth).await?;
        self.select_subjects(&fields.subjects).await?;
        let _ = self.select_hobbies(&fields.hobbies).await?;
        self.upload_file(upload).await?;
        self.fill_address(&fields.address).await?;
        let _ = self
            .select_state_and_city(&fields.state, &fields.city)
            .await?;
        self.submit().await?;
        self.wait_for_confirmation().await?;
        self.validate_title(None).await?;
        let snapshot = self.validate_submission(fields).await?;
        self.close_confirmation().await?;
        Ok(snapshot)
    }
}

impl PageObject for StudentRegistrationForm<'_> {
    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Contains(self.config.form_path.clone())
    }

    fn ready_marker(&self) -> Selector {
        Selector::css(selectors::FIRST_NAME)
    }

    fn load_timeout_ms(&self) -> u64 {
        self.config.timeouts.navigation_ms
    }

    fn page_name(&self) -> &str {
        "student registration form"
    }
}
