//! Browser control for the registration suite.
//!
//! With the `browser` feature this launches Chromium and drives pages over
//! the Chrome `DevTools` Protocol through chromiumoxide. Without it,
//! [`Browser::launch`] fails with a launch error and only the mock driver is
//! usable.

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::locator::{js_str, Selector};
use crate::result::{ProbeError, ProbeResult};
use std::path::PathBuf;
use std::time::Duration;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// CDP request timeout
    pub request_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl BrowserConfig {
    /// Browser settings of a suite configuration.
    ///
    /// The CDP command timeout covers the slowest single command, which is
    /// `Page.navigate` under the navigation budget.
    #[must_use]
    pub fn from_suite(config: &SuiteConfig) -> Self {
        let timeouts = &config.timeouts;
        let command_ms = timeouts.navigation_ms.max(timeouts.action_ms);
        Self {
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            chromium_path: config.chromium_path.clone(),
            sandbox: config.sandbox,
            request_timeout: Duration::from_millis(command_ms),
        }
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// CDP description of a named key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDefinition {
    /// `key` property of the DOM event
    pub key: &'static str,
    /// `code` property of the DOM event
    pub code: &'static str,
    /// Windows virtual key code
    pub key_code: i64,
    /// Text the key inserts, if any
    pub text: Option<&'static str>,
}

/// Look up a named key ("Enter", "Tab", "Space", ...)
#[must_use]
pub fn key_definition(name: &str) -> Option<KeyDefinition> {
    let (key, code, key_code, text) = match name {
        "Enter" => ("Enter", "Enter", 13, Some("\r")),
        "Tab" => ("Tab", "Tab", 9, None),
        "Space" | " " => (" ", "Space", 32, Some(" ")),
        "Escape" => ("Escape", "Escape", 27, None),
        "Backspace" => ("Backspace", "Backspace", 8, None),
        "ArrowDown" => ("ArrowDown", "ArrowDown", 40, None),
        "ArrowUp" => ("ArrowUp", "ArrowUp", 38, None),
        _ => return None,
    };
    Some(KeyDefinition {
        key,
        code,
        key_code,
        text,
    })
}

/// Attribute used to hand an element found by script to a CDP node lookup
const MARKER_ATTRIBUTE: &str = "data-formprobe-target";

// ============================================================================
// Page scripts
// ============================================================================

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
mod scripts {
    use super::{js_str, Selector, MARKER_ATTRIBUTE};

    fn on_element(selector: &Selector, body: &str) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return null; {body} }})()",
            selector.to_query()
        )
    }

    /// Scroll into view, then the center point or `null`
    pub fn click_point(selector: &Selector) -> String {
        on_element(
            selector,
            "el.scrollIntoView({ block: 'center', inline: 'center' }); \
             const r = el.getBoundingClientRect(); \
             return { x: r.x + r.width / 2, y: r.y + r.height / 2 };",
        )
    }

    pub fn force_click(selector: &Selector) -> String {
        on_element(selector, "el.click(); return true;")
    }

    pub fn focus(selector: &Selector) -> String {
        on_element(selector, "el.focus(); return true;")
    }

    /// Focus and select the current value so typed text replaces it
    pub fn focus_and_select(selector: &Selector) -> String {
        on_element(
            selector,
            "el.focus(); if (typeof el.select === 'function') el.select(); return true;",
        )
    }

    /// Pick an option by value or label; `false` when none matches
    pub fn select_option(selector: &Selector, value: &str) -> String {
        let value = js_str(value);
        on_element(
            selector,
            &format!(
                "const opt = Array.from(el.options || []).find(o => o.value === {value} || o.text.trim() === {value}); \
                 if (!opt) return false; \
                 const setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set; \
                 setter.call(el, opt.value); \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                 return true;"
            ),
        )
    }

    /// Tag the element so it can be found by a plain CSS query
    pub fn mark(selector: &Selector) -> String {
        on_element(
            selector,
            &format!(
                "document.querySelectorAll('[{MARKER_ATTRIBUTE}]').forEach(e => e.removeAttribute('{MARKER_ATTRIBUTE}')); \
                 el.setAttribute('{MARKER_ATTRIBUTE}', ''); return true;"
            ),
        )
    }

    pub fn table_rows(container: &Selector) -> String {
        on_element(
            container,
            "return Array.from(el.querySelectorAll('tr')).map(tr => \
               Array.from(tr.querySelectorAll('th, td')).map(c => (c.textContent || '').trim()));",
        )
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::{
        key_definition, scripts, BrowserConfig, KeyDefinition, PageDriver, ProbeError,
        ProbeResult, Selector, MARKER_ATTRIBUTE,
    };
    use crate::driver::ElementState;
    use crate::locator::Point;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::error::CdpError;
    use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
    };
    use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::layout::Point as CdpPoint;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tracing::{debug, info};

    fn page_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::PageError {
            message: e.to_string(),
        }
    }

    /// The target or the connection to it is gone
    fn is_closed(e: &CdpError) -> bool {
        match e {
            CdpError::ChannelSendError(_) | CdpError::NoResponse => true,
            CdpError::Chrome(err) => {
                err.message.contains("Target closed")
                    || err.message.contains("Session with given id not found")
            }
            _ => false,
        }
    }

    fn cdp_error(e: CdpError) -> ProbeError {
        if is_closed(&e) {
            ProbeError::PageClosed {
                message: e.to_string(),
            }
        } else {
            page_error(e)
        }
    }

    fn interaction_error(selector: &Selector, e: CdpError) -> ProbeError {
        if is_closed(&e) {
            cdp_error(e)
        } else {
            ProbeError::interaction(selector.to_string(), e.to_string())
        }
    }

    fn launch_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::BrowserLaunchError {
            message: e.to_string(),
        }
    }

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                })
                .request_timeout(config.request_timeout);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(launch_error)?;
            let (browser, mut handler) = CdpBrowser::launch(cdp_config)
                .await
                .map_err(launch_error)?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });
            info!(headless = config.headless, "browser launched");

            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Open a blank page
        pub async fn new_page(&self) -> ProbeResult<ChromiumDriver> {
            let browser = self.inner.lock().await;
            let page = browser.new_page("about:blank").await.map_err(page_error)?;
            Ok(ChromiumDriver { page })
        }

        /// Open a blank page behind the driver trait
        pub async fn new_driver(&self) -> ProbeResult<Box<dyn PageDriver>> {
            Ok(Box::new(self.new_page().await?))
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser and stop its event loop
        pub async fn close(&self) -> ProbeResult<()> {
            let mut browser = self.inner.lock().await;
            browser.close().await.map_err(launch_error)?;
            let _ = browser.wait().await;
            self.handle.abort();
            Ok(())
        }
    }

    /// [`PageDriver`] over one Chromium page
    #[derive(Debug)]
    pub struct ChromiumDriver {
        page: CdpPage,
    }

    impl ChromiumDriver {
        async fn eval(&self, script: &str) -> ProbeResult<serde_json::Value> {
            let params = EvaluateParams::builder()
                .expression(script)
                .await_promise(true)
                .return_by_value(true)
                .build()
                .map_err(page_error)?;
            let result = self
                .page
                .evaluate_expression(params)
                .await
                .map_err(cdp_error)?;
            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        }

        /// Run an element script; `null` means the element is not attached
        async fn on_element(
            &self,
            selector: &Selector,
            script: String,
        ) -> ProbeResult<serde_json::Value> {
            let value = self.eval(&script).await.map_err(|e| {
                if e.is_page_closed() {
                    e
                } else {
                    ProbeError::interaction(selector.to_string(), e.to_string())
                }
            })?;
            if value.is_null() {
                return Err(ProbeError::interaction(
                    selector.to_string(),
                    "element is not attached",
                ));
            }
            Ok(value)
        }

        async fn dispatch_key(&self, def: KeyDefinition) -> ProbeResult<()> {
            for (kind, text) in [
                (DispatchKeyEventType::KeyDown, def.text),
                (DispatchKeyEventType::KeyUp, None),
            ] {
                let mut builder = DispatchKeyEventParams::builder()
                    .r#type(kind)
                    .key(def.key)
                    .code(def.code)
                    .windows_virtual_key_code(def.key_code)
                    .native_virtual_key_code(def.key_code);
                if let Some(text) = text {
                    builder = builder.text(text);
                }
                let params = builder.build().map_err(page_error)?;
                self.page.execute(params).await.map_err(cdp_error)?;
            }
            Ok(())
        }

        async fn dispatch_char(&self, c: char) -> ProbeResult<()> {
            let s = c.to_string();
            let down = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyDown)
                .key(s.clone())
                .text(s.clone())
                .build()
                .map_err(page_error)?;
            let up = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyUp)
                .key(s)
                .build()
                .map_err(page_error)?;
            self.page.execute(down).await.map_err(cdp_error)?;
            self.page.execute(up).await.map_err(cdp_error)?;
            Ok(())
        }

    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        // Returns once the navigation commits; load is awaited by the caller's
        // dom_ready wait under its own budget.
        async fn navigate(&self, url: &str) -> ProbeResult<()> {
            debug!(url, "navigate");
            let navigation_error = |message: String| ProbeError::NavigationError {
                url: url.to_string(),
                message,
            };
            let response = self
                .page
                .execute(NavigateParams::new(url))
                .await
                .map_err(|e| {
                    if is_closed(&e) {
                        cdp_error(e)
                    } else {
                        navigation_error(e.to_string())
                    }
                })?;
            match response.result.error_text {
                Some(ref text) if !text.is_empty() => Err(navigation_error(text.clone())),
                _ => Ok(()),
            }
        }

        async fn ready_state(&self) -> ProbeResult<String> {
            let value = self.eval("document.readyState").await?;
            Ok(value.as_str().unwrap_or_default().to_string())
        }

        async fn current_url(&self) -> ProbeResult<String> {
            Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
        }

        async fn element_state(&self, selector: &Selector) -> ProbeResult<Option<ElementState>> {
            let value = self.eval(&selector.to_state_query()).await?;
            if value.is_null() {
                return Ok(None);
            }
            Ok(Some(serde_json::from_value(value)?))
        }

        async fn click(&self, selector: &Selector) -> ProbeResult<()> {
            let value = self
                .on_element(selector, scripts::click_point(selector))
                .await?;
            let point: Point = serde_json::from_value(value)?;
            self.page
                .click(CdpPoint {
                    x: point.x,
                    y: point.y,
                })
                .await
                .map_err(|e| interaction_error(selector, e))?;
            Ok(())
        }

        async fn force_click(&self, selector: &Selector) -> ProbeResult<()> {
            let _ = self
                .on_element(selector, scripts::force_click(selector))
                .await?;
            Ok(())
        }

        async fn fill(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
            let _ = self
                .on_element(selector, scripts::focus_and_select(selector))
                .await?;
            if text.is_empty() {
                return self.press_key("Backspace").await;
            }
            self.page
                .execute(InsertTextParams::new(text))
                .await
                .map_err(|e| interaction_error(selector, e))?;
            Ok(())
        }

        async fn select_option(&self, selector: &Selector, value: &str) -> ProbeResult<()> {
            let found = self
                .on_element(selector, scripts::select_option(selector, value))
                .await?;
            if found.as_bool() == Some(true) {
                Ok(())
            } else {
                Err(ProbeError::interaction(
                    selector.to_string(),
                    format!("no option '{value}'"),
                ))
            }
        }

        async fn focus(&self, selector: &Selector) -> ProbeResult<()> {
            let _ = self.on_element(selector, scripts::focus(selector)).await?;
            Ok(())
        }

        async fn press_key(&self, key: &str) -> ProbeResult<()> {
            let def = key_definition(key)
                .ok_or_else(|| ProbeError::invalid_data(format!("unknown key: {key}")))?;
            self.dispatch_key(def).await
        }

        async fn type_keys(&self, text: &str) -> ProbeResult<()> {
            for c in text.chars() {
                self.dispatch_char(c).await?;
            }
            Ok(())
        }

        async fn set_input_files(
            &self,
            selector: &Selector,
            files: &[PathBuf],
        ) -> ProbeResult<()> {
            let paths = files
                .iter()
                .map(|p| std::fs::canonicalize(p).map(|p| p.to_string_lossy().into_owned()))
                .collect::<Result<Vec<_>, _>>()?;
            let _ = self.on_element(selector, scripts::mark(selector)).await?;
            let element = self
                .page
                .find_element(format!("[{MARKER_ATTRIBUTE}]"))
                .await
                .map_err(|e| interaction_error(selector, e))?;
            let params = SetFileInputFilesParams::builder()
                .files(paths)
                .backend_node_id(element.backend_node_id)
                .build()
                .map_err(page_error)?;
            self.page
                .execute(params)
                .await
                .map_err(|e| interaction_error(selector, e))?;
            Ok(())
        }

        async fn table_rows(&self, container: &Selector) -> ProbeResult<Vec<Vec<String>>> {
            let value = self
                .on_element(container, scripts::table_rows(container))
                .await?;
            Ok(serde_json::from_value(value)?)
        }

        async fn evaluate(&self, script: &str) -> ProbeResult<serde_json::Value> {
            self.eval(script).await
        }

        async fn close(&self) -> ProbeResult<()> {
            self.page.clone().close().await.map_err(cdp_error)
        }
    }
}

// ============================================================================
// Stand-in (when `browser` feature is NOT enabled)
// ============================================================================

#[cfg(not(feature = "browser"))]
mod unavailable {
    use super::{BrowserConfig, PageDriver, ProbeError, ProbeResult};

    fn not_built() -> ProbeError {
        ProbeError::BrowserLaunchError {
            message: "formprobe was built without the `browser` feature".to_string(),
        }
    }

    /// Browser handle; launching always fails in this build
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
    }

    impl Browser {
        /// Always fails: no browser backend is compiled in
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let _ = config;
            Err(not_built())
        }

        /// Open a blank page behind the driver trait
        pub async fn new_driver(&self) -> ProbeResult<Box<dyn PageDriver>> {
            Err(not_built())
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(&self) -> ProbeResult<()> {
            Ok(())
        }
    }
}

// Re-export based on feature
#[cfg(feature = "browser")]
pub use cdp::{Browser, ChromiumDriver};

#[cfg(not(feature = "browser"))]
pub use unavailable::Browser;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_suite() {
        let mut suite = SuiteConfig::default();
        suite.headless = false;
        suite.viewport_width = 1920;
        suite.chromium_path = Some(PathBuf::from("/usr/bin/chromium"));
        let config = BrowserConfig::from_suite(&suite);
        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1920);
        assert_eq!(config.viewport_height, 720);
        assert!(config.sandbox);
        assert_eq!(
            config.chromium_path.as_deref(),
            Some(std::path::Path::new("/usr/bin/chromium"))
        );
    }

    #[test]
    fn test_request_timeout_covers_navigation() {
        let mut suite = SuiteConfig::default();
        let config = BrowserConfig::from_suite(&suite);
        assert_eq!(config.request_timeout, Duration::from_millis(60_000));

        suite.timeouts.navigation_ms = 90_000;
        suite.timeouts.action_ms = 5_000;
        let config = BrowserConfig::from_suite(&suite);
        assert!(config.request_timeout >= Duration::from_millis(suite.timeouts.navigation_ms));

        suite.timeouts.navigation_ms = 1_000;
        suite.timeouts.action_ms = 20_000;
        let config = BrowserConfig::from_suite(&suite);
        assert_eq!(config.request_timeout, Duration::from_millis(20_000));
    }

    #[test]
    fn test_from_suite_can_disable_sandbox() {
        let suite = SuiteConfig::from_yaml("sandbox: false\n").unwrap();
        assert!(!BrowserConfig::from_suite(&suite).sandbox);
    }

    #[test]
    fn test_builders() {
        let config = BrowserConfig::default()
            .with_viewport(800, 600)
            .with_headless(false)
            .with_no_sandbox()
            .with_chromium_path("/opt/chrome");
        assert_eq!((config.viewport_width, config.viewport_height), (800, 600));
        assert!(!config.headless);
        assert!(!config.sandbox);
    }

    #[test]
    fn test_key_definitions() {
        let enter = key_definition("Enter").unwrap();
        assert_eq!(enter.key_code, 13);
        assert_eq!(enter.text, Some("\r"));
        let space = key_definition("Space").unwrap();
        assert_eq!(space.key, " ");
        assert_eq!(space.code, "Space");
        assert_eq!(key_definition("Tab").unwrap().text, None);
        assert!(key_definition("F13").is_none());
    }

    #[test]
    fn test_scripts_embed_selector_query() {
        let sel = Selector::css("#state");
        let script = scripts::select_option(&sel, "NCR");
        assert!(script.contains("document.querySelector(\"#state\")"));
        assert!(script.contains("\"NCR\""));
        assert!(scripts::mark(&sel).contains(MARKER_ATTRIBUTE));
        assert!(scripts::table_rows(&sel).contains("querySelectorAll('tr')"));
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_launch_without_backend_fails() {
        let err = Browser::launch(BrowserConfig::default()).await.unwrap_err();
        assert!(matches!(err, ProbeError::BrowserLaunchError { .. }));
    }
}
