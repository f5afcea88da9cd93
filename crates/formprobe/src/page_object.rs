//! Page Object Model support.
//!
//! A page object owns the selectors of one page and exposes intention-level
//! operations. This trait carries the page-independent part: where the page
//! lives and how to tell it has loaded.

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::ProbeResult;
use crate::wait::UrlPattern;
use async_trait::async_trait;

/// Trait for page objects representing a page in the UI.
#[async_trait]
pub trait PageObject: Send + Sync {
    /// URL pattern that matches this page
    fn url_pattern(&self) -> UrlPattern;

    /// Element whose visibility marks the page as usable
    fn ready_marker(&self) -> Selector;

    /// Wait budget for page load (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        30_000
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the driver currently shows this page, ready for interaction
    async fn is_loaded(&self, driver: &dyn PageDriver) -> ProbeResult<bool> {
        if !self.url_pattern().matches(&driver.current_url().await?)? {
            return Ok(false);
        }
        Ok(driver
            .element_state(&self.ready_marker())
            .await?
            .is_some_and(|s| s.visible))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ElementState, MockDriver};

    struct LoginPage;

    impl PageObject for LoginPage {
        fn url_pattern(&self) -> UrlPattern {
            UrlPattern::Glob("**/login".to_string())
        }

        fn ready_marker(&self) -> Selector {
            Selector::css("#username")
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(LoginPage.load_timeout_ms(), 30_000);
        assert!(LoginPage.page_name().ends_with("LoginPage"));
    }

    #[tokio::test]
    async fn test_is_loaded_needs_url_and_marker() {
        let driver = MockDriver::new();
        driver.set_url("https://demoqa.com/login");
        assert!(!LoginPage.is_loaded(&driver).await.unwrap());

        driver.set_element("#username", ElementState::visible());
        assert!(LoginPage.is_loaded(&driver).await.unwrap());

        driver.set_url("https://demoqa.com/books");
        assert!(!LoginPage.is_loaded(&driver).await.unwrap());
    }
}
