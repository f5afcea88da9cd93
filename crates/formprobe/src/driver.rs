//! PageDriver - Abstract Browser Automation Trait
//!
//! Everything above this seam (waits, the resolver, the form page object)
//! talks to a page only through [`PageDriver`]. Two implementations ship:
//!
//! - `ChromiumDriver` (feature `browser`) - real CDP via chromiumoxide
//! - [`MockDriver`] - scripted in-memory page for unit tests
//!
//! Drivers never wait on their own; polling belongs to the wait policy.

use crate::locator::{BoundingBox, Selector};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Observable state of an attached element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementState {
    /// Rendered and not hidden by style
    pub visible: bool,
    /// Not `disabled`
    pub enabled: bool,
    /// Client bounding box
    pub bounding_box: Option<BoundingBox>,
    /// Trimmed text content
    pub text: String,
    /// Form control value, if the element has one
    pub value: Option<String>,
    /// Files attached to a file input
    pub file_count: usize,
    /// `option` descendants (select elements)
    pub option_count: usize,
}

impl ElementState {
    /// A visible, enabled element with a unit bounding box
    #[must_use]
    pub fn visible() -> Self {
        Self {
            visible: true,
            enabled: true,
            bounding_box: Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            ..Self::default()
        }
    }

    /// An attached but hidden element
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            visible: false,
            enabled: true,
            ..Self::default()
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set bounding box
    #[must_use]
    pub const fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    /// Set enabled flag
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set attached file count
    #[must_use]
    pub const fn with_files(mut self, count: usize) -> Self {
        self.file_count = count;
        self
    }

    /// Set option count
    #[must_use]
    pub const fn with_options(mut self, count: usize) -> Self {
        self.option_count = count;
        self
    }

    /// Whether the element occupies a non-zero render area
    #[must_use]
    pub fn has_render_area(&self) -> bool {
        self.bounding_box.is_some_and(|b| b.has_area())
    }

    /// Visible, not disabled, and rendered with non-zero area
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.visible && self.enabled && self.has_render_area()
    }
}

/// Abstract driver trait for browser automation
///
/// One driver wraps exactly one page. All methods take `&self`; drivers keep
/// whatever interior state they need.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL and return once the document has been committed
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// `document.readyState` ("loading", "interactive" or "complete")
    async fn ready_state(&self) -> ProbeResult<String>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// State of the first element matching `selector`, `None` if detached
    async fn element_state(&self, selector: &Selector) -> ProbeResult<Option<ElementState>>;

    /// Scroll into view and click the element center
    async fn click(&self, selector: &Selector) -> ProbeResult<()>;

    /// Dispatch a click without actionability checks
    async fn force_click(&self, selector: &Selector) -> ProbeResult<()>;

    /// Replace the value of an input or textarea
    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Select an option of a `select` element by value or label
    async fn select_option(&self, selector: &Selector, value: &str) -> ProbeResult<()>;

    /// Focus the element
    async fn focus(&self, selector: &Selector) -> ProbeResult<()>;

    /// Press a named key ("Enter", "Tab", "Space") on the focused element
    async fn press_key(&self, key: &str) -> ProbeResult<()>;

    /// Type text through the keyboard into the focused element
    async fn type_keys(&self, text: &str) -> ProbeResult<()>;

    /// Attach local files to a file input
    async fn set_input_files(&self, selector: &Selector, files: &[PathBuf]) -> ProbeResult<()>;

    /// Cell texts of every `tr` under the container, row by row
    async fn table_rows(&self, container: &Selector) -> ProbeResult<Vec<Vec<String>>>;

    /// Execute JavaScript in page context
    async fn evaluate(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// Close the page; the driver is unusable afterwards
    async fn close(&self) -> ProbeResult<()>;
}

/// Mutable state behind [`MockDriver`]
#[derive(Debug, Default)]
struct MockState {
    url: String,
    redirect: Option<String>,
    ready_state: String,
    elements: HashMap<String, VecDeque<ElementState>>,
    failing: HashSet<String>,
    tables: HashMap<String, Vec<Vec<String>>>,
    js_results: VecDeque<serde_json::Value>,
    history: Vec<String>,
}

/// Mock driver for unit testing
///
/// Elements are keyed by the selector's `Display` form. Registering a
/// sequence of states makes successive `element_state` calls walk through it;
/// the last state then sticks.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create new mock driver with a parsed document
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.lock().ready_state = "complete".to_string();
        driver
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a single element state
    pub fn set_element(&self, selector: impl ToString, state: ElementState) {
        self.set_element_sequence(selector, vec![state]);
    }

    /// Register a sequence of states returned on successive polls
    pub fn set_element_sequence(&self, selector: impl ToString, states: Vec<ElementState>) {
        let _ = self
            .lock()
            .elements
            .insert(selector.to_string(), states.into());
    }

    /// Detach an element
    pub fn remove_element(&self, selector: impl ToString) {
        let _ = self.lock().elements.remove(&selector.to_string());
    }

    /// Make every interaction with the selector raise
    pub fn fail_interactions(&self, selector: impl ToString) {
        let _ = self.lock().failing.insert(selector.to_string());
    }

    /// Register table rows under a container
    pub fn set_table(&self, container: impl ToString, rows: Vec<Vec<String>>) {
        let _ = self.lock().tables.insert(container.to_string(), rows);
    }

    /// Set the document ready state
    pub fn set_ready_state(&self, state: impl Into<String>) {
        self.lock().ready_state = state.into();
    }

    /// Set the current URL
    pub fn set_url(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    /// Queue a result for the next `evaluate` call
    pub fn push_js_result(&self, value: serde_json::Value) {
        self.lock().js_results.push_back(value);
    }

    /// Make the next navigation land on `url` instead of the requested one
    pub fn redirect_next_navigation(&self, url: impl Into<String>) {
        self.lock().redirect = Some(url.into());
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(method))
    }

    /// Count history entries starting with `prefix`
    #[must_use]
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, entry: String) {
        self.lock().history.push(entry);
    }

    fn interact(&self, verb: &str, selector: &Selector, detail: Option<&str>) -> ProbeResult<()> {
        let key = selector.to_string();
        let mut state = self.lock();
        state.history.push(match detail {
            Some(d) => format!("{verb}:{key}={d}"),
            None => format!("{verb}:{key}"),
        });
        if state.failing.contains(&key) {
            return Err(ProbeError::interaction(key, format!("{verb} rejected")));
        }
        if !state.elements.contains_key(&key) {
            return Err(ProbeError::interaction(key, "element is not attached"));
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        state.history.push(format!("navigate:{url}"));
        state.url = state.redirect.take().unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn ready_state(&self) -> ProbeResult<String> {
        Ok(self.lock().ready_state.clone())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn element_state(&self, selector: &Selector) -> ProbeResult<Option<ElementState>> {
        let key = selector.to_string();
        let mut state = self.lock();
        state.history.push(format!("state:{key}"));
        Ok(state.elements.get_mut(&key).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }))
    }

    async fn click(&self, selector: &Selector) -> ProbeResult<()> {
        self.interact("click", selector, None)
    }

    async fn force_click(&self, selector: &Selector) -> ProbeResult<()> {
        self.interact("force_click", selector, None)
    }

    async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
        self.interact("fill", selector, Some(text))
    }

    async fn select_option(&self, selector: &Selector, value: &str) -> ProbeResult<()> {
        self.interact("select", selector, Some(value))
    }

    async fn focus(&self, selector: &Selector) -> ProbeResult<()> {
        self.interact("focus", selector, None)
    }

    async fn press_key(&self, key: &str) -> ProbeResult<()> {
        self.record(format!("press:{key}"));
        Ok(())
    }

    async fn type_keys(&self, text: &str) -> ProbeResult<()> {
        self.record(format!("type:{text}"));
        Ok(())
    }

    async fn set_input_files(&self, selector: &Selector, files: &[PathBuf]) -> ProbeResult<()> {
        let names = files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.interact("files", selector, Some(&names))?;
        let mut state = self.lock();
        if let Some(queue) = state.elements.get_mut(&selector.to_string()) {
            for entry in queue.iter_mut() {
                entry.file_count = files.len();
            }
        }
        Ok(())
    }

    async fn table_rows(&self, container: &Selector) -> ProbeResult<Vec<Vec<String>>> {
        let key = container.to_string();
        let mut state = self.lock();
        state.history.push(format!("rows:{key}"));
        Ok(state.tables.get(&key).cloned().unwrap_or_default())
    }

    async fn evaluate(&self, script: &str) -> ProbeResult<serde_json::Value> {
        let mut state = self.lock();
        state.history.push(format!("evaluate:{} bytes", script.len()));
        Ok(state
            .js_results
            .pop_front()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn close(&self) -> ProbeResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Whether every path exists on disk
pub(crate) fn missing_files(files: &[PathBuf]) -> Vec<&Path> {
    files
        .iter()
        .map(PathBuf::as_path)
        .filter(|p| !p.exists())
        .collect()
}
