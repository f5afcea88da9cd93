//! formprobe: resilient end-to-end driver for the DemoQA student
//! registration form.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     formprobe Architecture                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌──────────┐   ┌─────────┐  │
//! │  │ TestData   │   │ Registration │   │ Resolver │   │ Page    │  │
//! │  │ Provider   │──►│ Form (page   │──►│ + Wait   │──►│ Driver  │  │
//! │  │ (seeded)   │   │ object)      │   │ Policy   │   │ (CDP)   │  │
//! │  └────────────┘   └──────────────┘   └──────────┘   └─────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The form page object expresses each field as a [`LogicalTarget`]: an
//! ordered list of locator strategies tried until one works. Every wait goes
//! through [`WaitPolicy`], which polls a [`PageDriver`] with explicit
//! timeouts. [`MockDriver`] stands in for a browser in unit tests.

#![warn(missing_docs)]

mod browser;
mod config;
mod data;
mod driver;
mod harness;
mod locator;
mod page_object;
mod resolver;
mod result;
mod wait;

/// The student registration page object and its locator strategies
pub mod form;

/// Form records, reference tables and the submitted-data snapshot
pub mod model;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use browser::{key_definition, Browser, BrowserConfig, KeyDefinition};
pub use config::{ms, BrowserKind, SettleDelays, SuiteConfig, Timeouts, DEFAULT_CONFIG_FILE};
pub use data::{Seed, TestDataProvider, DEFAULT_BASE_SEED, MAX_AGE_YEARS, MIN_AGE_YEARS};
pub use driver::{ElementState, MockDriver, PageDriver};
pub use form::{StudentRegistrationForm, DEFAULT_CONFIRMATION_TITLE};
pub use harness::{
    build_cases, run_on_page, run_registration, CaseRecorder, CaseResult, CaseSource,
    ScenarioCase, StepResult, SuiteReport, REPORT_FILE,
};
pub use locator::{BoundingBox, Point, Selector};
pub use model::{DateOfBirth, FormFieldSet, Gender, Hobby, SubmittedDataSnapshot};
pub use page_object::PageObject;
pub use resolver::{
    Interaction, KeyInput, LogicalTarget, Resolution, Resolver, Strategy,
    DEFAULT_STRATEGY_TIMEOUT_MS,
};
pub use result::{ProbeError, ProbeResult, StrategyFailure};
pub use wait::{
    LoadState, UrlMatcher, UrlPattern, WaitPolicy, WaitResult, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS, NETWORK_IDLE_SETTLE_MS,
};

/// Common imports for suite code
pub mod prelude {
    pub use super::{
        build_cases, run_registration, Browser, BrowserConfig, FormFieldSet, Gender, Hobby,
        LogicalTarget, PageDriver, ProbeError, ProbeResult, Resolver, Selector, Strategy,
        StudentRegistrationForm, SuiteConfig, SuiteReport, TestDataProvider, WaitPolicy,
    };
}
