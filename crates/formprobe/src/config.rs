//! Suite configuration.
//!
//! [`SuiteConfig`] holds every timeout, settle delay and run parameter. It
//! deserializes from YAML (`formprobe.yaml`); absent keys take defaults.

use crate::data::DEFAULT_BASE_SEED;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS, NETWORK_IDLE_SETTLE_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "formprobe.yaml";

/// Browser engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Chromium / Chrome
    #[default]
    Chrome,
    /// Firefox
    Firefox,
}

impl BrowserKind {
    /// Whether this engine can be driven over the DevTools protocol
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Chrome)
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chrome => write!(f, "chrome"),
            Self::Firefox => write!(f, "firefox"),
        }
    }
}

impl std::str::FromStr for BrowserKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            other => Err(ProbeError::config(format!("unknown browser: {other}"))),
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Page navigation
    pub navigation_ms: u64,
    /// Single browser action
    pub action_ms: u64,
    /// Element waits
    pub element_ms: u64,
    /// Per strategy when resolving gender radios
    pub gender_strategy_ms: u64,
    /// Per strategy when resolving a date-picker day
    pub day_strategy_ms: u64,
    /// Per strategy when resolving dropdown options
    pub dropdown_strategy_ms: u64,
    /// Per strategy when resolving hobby checkboxes
    pub hobby_strategy_ms: u64,
    /// Best-effort network idle
    pub network_idle_ms: u64,
    /// Polling interval for every wait
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 60_000,
            action_ms: 15_000,
            element_ms: DEFAULT_WAIT_TIMEOUT_MS,
            gender_strategy_ms: 5_000,
            day_strategy_ms: 3_000,
            dropdown_strategy_ms: 3_000,
            hobby_strategy_ms: 3_000,
            network_idle_ms: 30_000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Fixed settle delays in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    /// After the document is parsed
    pub network_idle_ms: u64,
    /// After the confirmation modal appears
    pub modal_ms: u64,
    /// After opening a dropdown
    pub dropdown_open_ms: u64,
    /// After a state selection, before the city dropdown
    pub after_state_ms: u64,
    /// After changing calendar month or year
    pub calendar_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            network_idle_ms: NETWORK_IDLE_SETTLE_MS,
            modal_ms: 500,
            dropdown_open_ms: 1_000,
            after_state_ms: 200,
            calendar_ms: 1_000,
        }
    }
}

/// Complete suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Site origin
    pub base_url: String,
    /// Form path under the origin
    pub form_path: String,
    /// Browser engine
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Chromium executable; `None` lets the driver search
    pub chromium_path: Option<PathBuf>,
    /// Chromium sandbox; turn off inside containers
    pub sandbox: bool,
    /// Concurrent cases (0 = one per case)
    pub workers: usize,
    /// Seed of the first generated data set
    pub base_seed: u64,
    /// Number of generated data sets
    pub data_sets: usize,
    /// File attached to the picture input
    pub upload_file: PathBuf,
    /// Report output directory
    pub output_dir: PathBuf,
    /// Whether scenarios pick a gender when the record has one
    pub select_gender: bool,
    /// Timeouts
    pub timeouts: Timeouts,
    /// Settle delays
    pub settle: SettleDelays,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://demoqa.com".to_string(),
            form_path: "/automation-practice-form".to_string(),
            browser: BrowserKind::Chrome,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            workers: 0,
            base_seed: DEFAULT_BASE_SEED,
            data_sets: 3,
            upload_file: PathBuf::from("test-files/test-image.txt"),
            output_dir: PathBuf::from("target/formprobe"),
            select_gender: true,
            timeouts: Timeouts::default(),
            settle: SettleDelays::default(),
        }
    }
}

impl SuiteConfig {
    /// Parse from YAML text
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else `formprobe.yaml` if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> ProbeResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check values are usable
    pub fn validate(&self) -> ProbeResult<()> {
        if !self.browser.is_supported() {
            return Err(ProbeError::config(format!(
                "browser '{}' cannot be driven; only chrome is supported",
                self.browser
            )));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ProbeError::config(format!(
                "base_url must be http(s): {}",
                self.base_url
            )));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be positive"));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(ProbeError::config("viewport must be non-empty"));
        }
        Ok(())
    }

    /// Absolute form URL
    #[must_use]
    pub fn form_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.form_path.trim_start_matches('/')
        )
    }

    /// Effective number of concurrent cases for `cases` scheduled cases
    #[must_use]
    pub fn effective_workers(&self, cases: usize) -> usize {
        if self.workers == 0 {
            cases.max(1)
        } else {
            self.workers
        }
    }

    /// Polling interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.timeouts.poll_interval_ms)
    }
}

/// Milliseconds to [`Duration`]
#[must_use]
pub const fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(
            config.form_url(),
            "https://demoqa.com/automation-practice-form"
        );
        assert_eq!(config.timeouts.navigation_ms, 60_000);
        assert_eq!(config.timeouts.gender_strategy_ms, 5_000);
        assert_eq!(config.settle.modal_ms, 500);
        assert_eq!(config.base_seed, 123);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SuiteConfig::from_yaml(
            "headless: false\nworkers: 2\ntimeouts:\n  element_ms: 2500\n",
        )
        .unwrap();
        assert!(!config.headless);
        assert_eq!(config.workers, 2);
        assert_eq!(config.timeouts.element_ms, 2_500);
        assert_eq!(config.timeouts.action_ms, 15_000);
        assert_eq!(config.viewport_width, 1280);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = SuiteConfig {
            browser: BrowserKind::Chrome,
            data_sets: 5,
            ..SuiteConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("browser: chrome"));
        assert_eq!(SuiteConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_firefox_is_rejected() {
        let config = SuiteConfig {
            browser: "firefox".parse().unwrap(),
            ..SuiteConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("firefox"));
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        let config = SuiteConfig {
            base_url: "demoqa.com".to_string(),
            ..SuiteConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_form_url_joins_slashes() {
        let config = SuiteConfig {
            base_url: "http://localhost:8080/".to_string(),
            form_path: "form".to_string(),
            ..SuiteConfig::default()
        };
        assert_eq!(config.form_url(), "http://localhost:8080/form");
    }

    #[test]
    fn test_effective_workers() {
        let mut config = SuiteConfig::default();
        assert_eq!(config.effective_workers(4), 4);
        assert_eq!(config.effective_workers(0), 1);
        config.workers = 2;
        assert_eq!(config.effective_workers(4), 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formprobe.yaml");
        std::fs::write(&path, "base_seed: 7\ndata_sets: 1\n").unwrap();
        let config = SuiteConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.base_seed, 7);
        assert_eq!(config.data_sets, 1);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "browser: firefox\n").unwrap();
        assert!(matches!(
            SuiteConfig::load(&path),
            Err(ProbeError::Config { .. })
        ));
        assert!(matches!(
            SuiteConfig::load(&dir.path().join("missing.yaml")),
            Err(ProbeError::Io(_))
        ));
    }

    #[test]
    fn test_browser_parse() {
        assert_eq!("Chromium".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert!("safari".parse::<BrowserKind>().is_err());
    }
}
