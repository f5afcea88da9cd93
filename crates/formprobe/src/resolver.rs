//! Resilient locator resolution.
//!
//! A [`LogicalTarget`] names one UI element ("the Male radio button") and
//! carries an ordered list of [`Strategy`] candidates for reaching it. The
//! [`Resolver`] tries them strictly in order: wait for the element, perform
//! the interaction, and return on the first success. Failed attempts are
//! recorded, never undone, and the next strategy is tried. When every
//! strategy fails the caller gets [`ProbeError::ResolutionExhausted`] listing
//! each attempt and its reason.
//!
//! Keyboard entry is not a separate mechanism: it is a [`Strategy::Keyboard`]
//! placed last in the list.

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult, StrategyFailure};
use crate::wait::{WaitPolicy, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default per-strategy timeout (3 seconds)
pub const DEFAULT_STRATEGY_TIMEOUT_MS: u64 = 3_000;

/// Interaction performed on a resolved element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    /// Click the element center
    Click,
    /// Click without actionability checks; only attachment is awaited
    ForceClick,
    /// Replace the element value
    Fill(String),
    /// Choose an option of a native select
    SelectOption(String),
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Click => write!(f, "click"),
            Self::ForceClick => write!(f, "force-click"),
            Self::Fill(v) => write!(f, "fill \"{v}\""),
            Self::SelectOption(v) => write!(f, "select \"{v}\""),
        }
    }
}

/// One keyboard action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyInput {
    /// Press a named key ("Enter", "Tab", "Space")
    Press(String),
    /// Type literal text
    Type(String),
}

impl KeyInput {
    /// Press a named key
    #[must_use]
    pub fn press(key: impl Into<String>) -> Self {
        Self::Press(key.into())
    }

    /// Type literal text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Type(text.into())
    }
}

impl std::fmt::Display for KeyInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Press(k) => write!(f, "{k}"),
            Self::Type(t) => write!(f, "\"{t}\""),
        }
    }
}

/// One candidate way of reaching a logical target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Locate an element and interact with it
    Element {
        /// Candidate selector
        selector: Selector,
        /// Interaction to perform once the element is ready
        interaction: Interaction,
    },
    /// Drive the widget from the keyboard
    Keyboard {
        /// Element to focus first (only attachment is awaited); `None` keeps
        /// the current focus
        focus: Option<Selector>,
        /// Keys in order
        keys: Vec<KeyInput>,
    },
}

impl Strategy {
    /// Click strategy
    #[must_use]
    pub fn click(selector: impl Into<Selector>) -> Self {
        Self::Element {
            selector: selector.into(),
            interaction: Interaction::Click,
        }
    }

    /// Force-click strategy
    #[must_use]
    pub fn force_click(selector: impl Into<Selector>) -> Self {
        Self::Element {
            selector: selector.into(),
            interaction: Interaction::ForceClick,
        }
    }

    /// Fill strategy
    #[must_use]
    pub fn fill(selector: impl Into<Selector>, value: impl Into<String>) -> Self {
        Self::Element {
            selector: selector.into(),
            interaction: Interaction::Fill(value.into()),
        }
    }

    /// Select-option strategy
    #[must_use]
    pub fn select(selector: impl Into<Selector>, value: impl Into<String>) -> Self {
        Self::Element {
            selector: selector.into(),
            interaction: Interaction::SelectOption(value.into()),
        }
    }

    /// Keyboard strategy
    #[must_use]
    pub fn keyboard(focus: Option<Selector>, keys: Vec<KeyInput>) -> Self {
        Self::Keyboard { focus, keys }
    }

    /// Human-readable description used in logs and errors
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Element {
                selector,
                interaction,
            } => format!("{interaction} {selector}"),
            Self::Keyboard { focus, keys } => {
                let keys = keys
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                match focus {
                    Some(sel) => format!("keyboard on {sel}: {keys}"),
                    None => format!("keyboard: {keys}"),
                }
            }
        }
    }
}

impl From<Selector> for Strategy {
    fn from(selector: Selector) -> Self {
        Self::click(selector)
    }
}

/// A named UI element with its ordered fallback strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalTarget {
    name: String,
    strategies: Vec<Strategy>,
}

impl LogicalTarget {
    /// Create a logical target; at least one strategy is required
    pub fn new(name: impl Into<String>, strategies: Vec<Strategy>) -> ProbeResult<Self> {
        let name = name.into();
        if strategies.is_empty() {
            return Err(ProbeError::invalid_data(format!(
                "logical target \"{name}\" has no strategies"
            )));
        }
        Ok(Self { name, strategies })
    }

    /// Target name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategies in priority order
    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Logical target name
    pub target: String,
    /// Zero-based index of the strategy that succeeded
    pub strategy_index: usize,
    /// Description of the strategy that succeeded
    pub strategy: String,
    /// Earlier strategies that failed, in order
    pub failures: Vec<StrategyFailure>,
}

impl Resolution {
    /// Whether a fallback (not the first strategy) was needed
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.strategy_index > 0
    }
}

/// Tries strategies in order until one succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    strategy_timeout: Duration,
    poll_interval: Duration,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_STRATEGY_TIMEOUT_MS))
    }
}

impl Resolver {
    /// Create a resolver with the given per-strategy timeout
    #[must_use]
    pub const fn new(strategy_timeout: Duration) -> Self {
        Self {
            strategy_timeout,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set polling interval for the per-strategy waits
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Per-strategy timeout
    #[must_use]
    pub const fn strategy_timeout(&self) -> Duration {
        self.strategy_timeout
    }

    /// Resolve the target and perform the interaction of the first strategy
    /// that succeeds.
    ///
    /// Any failure of a strategy is recorded and the next one tried, except a
    /// closed page, which aborts resolution immediately.
    pub async fn resolve(
        &self,
        driver: &dyn PageDriver,
        target: &LogicalTarget,
    ) -> ProbeResult<Resolution> {
        let wait = WaitPolicy::new(driver).with_poll_interval(self.poll_interval);
        let mut failures = Vec::new();

        for (index, strategy) in target.strategies().iter().enumerate() {
            let description = strategy.describe();
            debug!(
                target_name = target.name(),
                index,
                strategy = %description,
                "trying strategy"
            );

            match self.attempt(driver, &wait, strategy).await {
                Ok(()) => {
                    info!(
                        target_name = target.name(),
                        index,
                        strategy = %description,
                        "resolved"
                    );
                    return Ok(Resolution {
                        target: target.name().to_string(),
                        strategy_index: index,
                        strategy: description,
                        failures,
                    });
                }
                Err(e) if e.is_page_closed() => return Err(e),
                Err(e) => {
                    warn!(
                        target_name = target.name(),
                        index,
                        strategy = %description,
                        error = %e,
                        "strategy failed"
                    );
                    failures.push(StrategyFailure {
                        index,
                        strategy: description,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(ProbeError::ResolutionExhausted {
            target: target.name().to_string(),
            attempts: failures,
        })
    }

    async fn attempt(
        &self,
        driver: &dyn PageDriver,
        wait: &WaitPolicy<'_>,
        strategy: &Strategy,
    ) -> ProbeResult<()> {
        match strategy {
            Strategy::Element {
                selector,
                interaction,
            } => {
                if *interaction == Interaction::ForceClick {
                    let _ = wait.element_attached(selector, self.strategy_timeout).await?;
                } else {
                    let _ = wait.element_visible(selector, self.strategy_timeout).await?;
                }
                match interaction {
                    Interaction::Click => driver.click(selector).await,
                    Interaction::ForceClick => driver.force_click(selector).await,
                    Interaction::Fill(value) => driver.fill(selector, value).await,
                    Interaction::SelectOption(value) => driver.select_option(selector, value).await,
                }
            }
            Strategy::Keyboard { focus, keys } => {
                if let Some(selector) = focus {
                    let _ = wait.element_attached(selector, self.strategy_timeout).await?;
                    driver.focus(selector).await?;
                }
                for key in keys {
                    match key {
                        KeyInput::Press(k) => driver.press_key(k).await?,
                        KeyInput::Type(t) => driver.type_keys(t).await?,
                    }
                }
                Ok(())
            }
        }
    }
}
