//! CLI configuration

use crate::commands::{Cli, ColorArg, TestArgs};
use formprobe::SuiteConfig;
use serde::{Deserialize, Serialize};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - step-level logs
    Verbose,
    /// Debug - every wait and strategy attempt
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Log filter used when `RUST_LOG` is not set
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "warn,formprobe=info",
            Self::Debug => "info,formprobe=debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// CLI presentation settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings from the global flags
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbosity: Verbosity::from_flags(cli.quiet, cli.verbose),
            color: cli.color.into(),
            log_json: cli.log_json,
        }
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Apply `formprobe test` flags on top of the loaded suite configuration
pub fn apply_test_overrides(suite: &mut SuiteConfig, args: &TestArgs) {
    if let Some(workers) = args.workers {
        suite.workers = workers;
    }
    if args.headed {
        suite.headless = false;
    }
    if let Some(ref url) = args.base_url {
        suite.base_url.clone_from(url);
    }
    if let Some(seed) = args.seed {
        suite.base_seed = seed;
    }
    if let Some(count) = args.data_sets {
        suite.data_sets = count;
    }
    if args.skip_gender {
        suite.select_gender = false;
    }
    if args.no_sandbox {
        suite.sandbox = false;
    }
    if let Some(ref dir) = args.output {
        suite.output_dir.clone_from(dir);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        }

        #[test]
        fn test_predicates() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }

        #[test]
        fn test_filter_directive() {
            assert_eq!(Verbosity::Normal.filter_directive(), "warn");
            assert!(Verbosity::Debug.filter_directive().contains("formprobe=debug"));
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }

        #[test]
        fn test_from_arg() {
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
        }
    }

    #[test]
    fn test_overrides_only_touch_given_flags() {
        let mut suite = SuiteConfig::default();
        let args = TestArgs {
            workers: Some(1),
            headed: true,
            base_url: Some("http://localhost:3000".to_string()),
            skip_gender: true,
            ..TestArgs::default()
        };
        apply_test_overrides(&mut suite, &args);
        assert_eq!(suite.workers, 1);
        assert!(!suite.headless);
        assert_eq!(suite.form_url(), "http://localhost:3000/automation-practice-form");
        assert!(!suite.select_gender);
        assert!(suite.sandbox);
        assert_eq!(suite.base_seed, 123);
        assert_eq!(suite.data_sets, 3);
    }

    #[test]
    fn test_no_sandbox_override() {
        let mut suite = SuiteConfig::default();
        let args = TestArgs {
            no_sandbox: true,
            ..TestArgs::default()
        };
        apply_test_overrides(&mut suite, &args);
        assert!(!suite.sandbox);
        assert!(!formprobe::BrowserConfig::from_suite(&suite).sandbox);
    }

    #[test]
    fn test_from_cli() {
        let cli = Cli::try_parse_from(["formprobe", "-v", "--color", "always", "data"]).unwrap();
        let config = CliConfig::from_cli(&cli);
        assert_eq!(config.verbosity, Verbosity::Verbose);
        assert_eq!(config.color, ColorChoice::Always);
        assert!(!config.log_json);
        assert_eq!(
            CliConfig::new().with_verbosity(Verbosity::Quiet).verbosity,
            Verbosity::Quiet
        );
    }
}
