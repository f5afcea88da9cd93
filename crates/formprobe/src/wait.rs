//! Wait Policy
//!
//! Named polling conditions with explicit timeouts. Every wait polls the
//! driver at a fixed interval until the condition holds or the timeout
//! elapses, then fails closed with [`ProbeError::WaitTimeout`]. No wait
//! retries beyond its own polling loop; callers choose whether to fall back,
//! retry or abort.
//!
//! [`WaitPolicy::settle`] is the only fixed sleep and exists for settle
//! delays appended after a condition has been observed.

use crate::driver::{ElementState, PageDriver};
use crate::locator::{BoundingBox, Selector};
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default settle delay after the document is parsed
pub const NETWORK_IDLE_SETTLE_MS: u64 = 1_000;

/// Descendants that mark a form as still busy
const BUSY_INDICATORS: [&str; 2] = ["[class*=\"loading\"]", "[class*=\"spinner\"]"];

// =============================================================================
// LOAD STATE
// =============================================================================

/// Document load states, mapped onto `document.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoadState {
    /// Document parsed (`interactive` or `complete`)
    DomContentLoaded,
    /// All subresources loaded (`complete`)
    #[default]
    Load,
}

impl LoadState {
    /// Whether the reported ready state satisfies this load state
    #[must_use]
    pub fn is_reached(&self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load => ready_state == "complete",
        }
    }

    /// Event name for diagnostics
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::Load => "load",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// URL PATTERN
// =============================================================================

/// URL pattern for [`WaitPolicy::url_matches`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Contains substring
    Contains(String),
    /// Glob pattern (e.g., "**/automation-practice-form*")
    Glob(String),
    /// Regex match
    Regex(String),
}

impl UrlPattern {
    /// Prepare for repeated matching; an invalid regex is rejected here
    pub fn compile(&self) -> ProbeResult<UrlMatcher<'_>> {
        let regex = match self {
            Self::Regex(pattern) => Some(regex::Regex::new(pattern).map_err(|e| {
                ProbeError::invalid_data(format!("invalid URL pattern /{pattern}/: {e}"))
            })?),
            _ => None,
        };
        Ok(UrlMatcher {
            pattern: self,
            regex,
        })
    }

    /// Check if a URL matches this pattern
    pub fn matches(&self, url: &str) -> ProbeResult<bool> {
        Ok(self.compile()?.matches(url))
    }
}

/// A [`UrlPattern`] compiled once for polling
#[derive(Debug)]
pub struct UrlMatcher<'p> {
    pattern: &'p UrlPattern,
    regex: Option<regex::Regex>,
}

impl UrlMatcher<'_> {
    /// Check if a URL matches
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        if let Some(ref re) = self.regex {
            return re.is_match(url);
        }
        match self.pattern {
            UrlPattern::Exact(pattern) => url == pattern,
            UrlPattern::Contains(pattern) => url.contains(pattern.as_str()),
            UrlPattern::Glob(pattern) => glob_matches(pattern, url),
            UrlPattern::Regex(_) => false,
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "{p}"),
            Self::Contains(p) => write!(f, "*{p}*"),
            Self::Glob(p) => write!(f, "glob:{p}"),
            Self::Regex(p) => write!(f, "/{p}/"),
        }
    }
}

/// Glob matching where `*` (or `**`) spans any run of characters.
///
/// The text before the first `*` anchors at the start of the URL and the text
/// after the last `*` anchors at its end.
fn glob_matches(pattern: &str, url: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, last) = match parts.as_slice() {
        [only] => return *only == url,
        [first, .., last] => (*first, *last),
        [] => return url.is_empty(),
    };
    if url.len() < first.len() + last.len() || !url.starts_with(first) || !url.ends_with(last) {
        return false;
    }
    let mut rest = &url[first.len()..url.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(found) => rest = &rest[found + part.len()..],
            None => return false,
        }
    }
    true
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Outcome of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAIT POLICY
// =============================================================================

/// Polling waits over one page driver
#[derive(Clone, Copy)]
pub struct WaitPolicy<'d> {
    driver: &'d dyn PageDriver,
    poll_interval: Duration,
}

impl std::fmt::Debug for WaitPolicy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitPolicy")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'d> WaitPolicy<'d> {
    /// Create a wait policy with the default poll interval
    #[must_use]
    pub fn new(driver: &'d dyn PageDriver) -> Self {
        Self {
            driver,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Polling interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `check` until it yields `true` or `timeout` elapses.
    ///
    /// A driver error counts as "not yet": the page may be mid-navigation.
    pub async fn poll_until<F, Fut>(
        &self,
        target: &str,
        condition: &str,
        timeout: Duration,
        mut check: F,
    ) -> ProbeResult<WaitResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<bool>>,
    {
        let start = Instant::now();
        loop {
            match check().await {
                Ok(true) => {
                    let elapsed = start.elapsed();
                    trace!(subject = target, condition, ?elapsed, "wait satisfied");
                    return Ok(WaitResult {
                        elapsed,
                        waited_for: format!("{target} {condition}"),
                    });
                }
                Ok(false) => {}
                Err(e) => trace!(subject = target, condition, error = %e, "probe failed, polling again"),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(ProbeError::WaitTimeout {
                    target: target.to_string(),
                    condition: condition.to_string(),
                    ms: timeout.as_millis() as u64,
                });
            }
            sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Poll the element state until `predicate` holds
    async fn element_until(
        &self,
        selector: &Selector,
        condition: &str,
        timeout: Duration,
        predicate: impl Fn(Option<&ElementState>) -> bool,
    ) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        let target = selector.to_string();
        let predicate = &predicate;
        self.poll_until(&target, condition, timeout, || async move {
            driver
                .element_state(selector)
                .await
                .map(|state| predicate(state.as_ref()))
        })
        .await
    }

    /// Wait for element to be visible
    pub async fn element_visible(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        self.element_until(selector, "visible", timeout, |s| s.is_some_and(|s| s.visible))
            .await
    }

    /// Wait for element to be visible, not disabled, and rendered with area
    pub async fn element_enabled(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        self.element_until(selector, "enabled", timeout, |s| {
            s.is_some_and(ElementState::is_actionable)
        })
        .await
    }

    /// Wait for element text (trimmed) to equal `expected`
    pub async fn element_text_equals(
        &self,
        selector: &Selector,
        expected: &str,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        let condition = format!("text \"{expected}\"");
        self.element_until(selector, &condition, timeout, |s| {
            s.is_some_and(|s| s.text.trim() == expected)
        })
        .await
    }

    /// Wait for element to be attached to the DOM
    pub async fn element_attached(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        self.element_until(selector, "attached", timeout, |s| s.is_some())
            .await
    }

    /// Wait for element to be detached from the DOM
    pub async fn element_detached(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        self.element_until(selector, "detached", timeout, |s| s.is_none())
            .await
    }

    /// Wait for a file input to report at least one attached file
    pub async fn file_input_has_files(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        self.element_until(selector, "holding a file", timeout, |s| {
            s.is_some_and(|s| s.file_count >= 1)
        })
        .await
    }

    /// Wait for a select element to hold at least one option
    pub async fn dropdown_options(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        self.element_until(selector, "populated with options", timeout, |s| {
            s.is_some_and(|s| s.option_count > 0)
        })
        .await
    }

    /// Wait for the document to reach a load state
    pub async fn load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        self.poll_until("document", state.event_name(), timeout, || async move {
            driver
                .ready_state()
                .await
                .map(|ready| state.is_reached(&ready))
        })
        .await
    }

    /// Wait for the document to be parsed
    pub async fn dom_ready(&self, timeout: Duration) -> ProbeResult<WaitResult> {
        self.load_state(LoadState::DomContentLoaded, timeout).await
    }

    /// Approximate network quiescence: document parsed, then a fixed settle.
    ///
    /// This is not a true idle guarantee; pair it with [`Self::best_effort`]
    /// where a timeout should not end the scenario.
    pub async fn network_idle(&self, timeout: Duration, settle: Duration) -> ProbeResult<WaitResult> {
        let mut result = self.dom_ready(timeout).await?;
        self.settle(settle).await;
        result.elapsed += settle;
        result.waited_for = "network idle".to_string();
        Ok(result)
    }

    /// Wait for the `load` event, then network idle
    pub async fn page_load(&self, timeout: Duration, settle: Duration) -> ProbeResult<WaitResult> {
        let loaded = self.load_state(LoadState::Load, timeout).await?;
        let remaining = timeout.saturating_sub(loaded.elapsed);
        let idle = self.network_idle(remaining, settle).await?;
        Ok(WaitResult {
            elapsed: loaded.elapsed + idle.elapsed,
            waited_for: "page load".to_string(),
        })
    }

    /// Wait for the current URL to match
    pub async fn url_matches(
        &self,
        pattern: &UrlPattern,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        let matcher = pattern.compile()?;
        let matcher = &matcher;
        let condition = format!("matching {pattern}");
        self.poll_until("url", &condition, timeout, || async move {
            driver.current_url().await.map(|url| matcher.matches(&url))
        })
        .await
    }

    /// Wait for a modal to be visible, then let its animation settle
    pub async fn modal(
        &self,
        selector: &Selector,
        timeout: Duration,
        settle: Duration,
    ) -> ProbeResult<WaitResult> {
        let result = self.element_visible(selector, timeout).await?;
        self.settle(settle).await;
        Ok(result)
    }

    /// Wait for a form to be visible with no loading or spinner descendants
    pub async fn form_ready(&self, form_css: &str, timeout: Duration) -> ProbeResult<WaitResult> {
        let form = Selector::css(form_css);
        let visible = self.element_visible(&form, timeout).await?;
        let busy = Selector::css(
            BUSY_INDICATORS
                .iter()
                .map(|b| format!("{form_css} {b}"))
                .collect::<Vec<_>>()
                .join(", "),
        );
        let remaining = timeout.saturating_sub(visible.elapsed);
        let idle = self.element_detached(&busy, remaining).await?;
        Ok(WaitResult {
            elapsed: visible.elapsed + idle.elapsed,
            waited_for: format!("{form_css} ready"),
        })
    }

    /// Wait until two consecutive bounding-box samples, `window` apart, agree
    pub async fn element_geometry_stable(
        &self,
        selector: &Selector,
        window: Duration,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        let start = Instant::now();
        let mut previous = self.bounding_box(selector).await;
        loop {
            if start.elapsed() + window > timeout {
                return Err(ProbeError::WaitTimeout {
                    target: selector.to_string(),
                    condition: "geometrically stable".to_string(),
                    ms: timeout.as_millis() as u64,
                });
            }
            sleep(window).await;
            let current = self.bounding_box(selector).await;
            if let (Some(a), Some(b)) = (previous, current) {
                if a == b {
                    debug!(selector = %selector, elapsed = ?start.elapsed(), "geometry stable");
                    return Ok(WaitResult {
                        elapsed: start.elapsed(),
                        waited_for: format!("{selector} geometrically stable"),
                    });
                }
            }
            previous = current;
        }
    }

    async fn bounding_box(&self, selector: &Selector) -> Option<BoundingBox> {
        match self.driver.element_state(selector).await {
            Ok(state) => state.and_then(|s| s.bounding_box),
            Err(e) => {
                trace!(selector = %selector, error = %e, "bounding box probe failed");
                None
            }
        }
    }

    /// Fixed sleep for animation or rendering lag that cannot be polled
    pub async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            trace!(?delay, "settling");
            sleep(delay).await;
        }
    }

    /// Downgrade a wait timeout to a warning; other errors still propagate
    pub fn best_effort<T>(result: ProbeResult<T>) -> ProbeResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "best-effort wait timed out, continuing");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
