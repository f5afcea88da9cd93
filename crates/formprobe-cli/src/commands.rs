//! CLI command definitions using clap

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// formprobe: end-to-end suite for the DemoQA student registration form
#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suite config file (default: ./formprobe.yaml when present)
    #[arg(short, long, global = true, env = "FORMPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the registration scenarios in a browser
    Test(TestArgs),

    /// Show a saved run report
    Report(ReportArgs),

    /// Print generated test data
    Data(DataArgs),

    /// Show, create or validate the suite configuration
    Config(ConfigArgs),
}

/// Arguments for the test command
#[derive(Parser, Debug, Default)]
pub struct TestArgs {
    /// Only run cases whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Concurrent cases (0 = one per case)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Site origin to test against
    #[arg(long, env = "FORMPROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Seed of the first generated data set
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of generated data sets
    #[arg(long)]
    pub data_sets: Option<usize>,

    /// Skip the gender step
    #[arg(long)]
    pub skip_gender: bool,

    /// Disable the Chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Output directory for the report
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Report file (default: <output_dir>/report.json)
    pub path: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: ReportFormat,
}

/// Report output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Arguments for the data command
#[derive(Parser, Debug)]
pub struct DataArgs {
    /// Number of records
    #[arg(short = 'n', long, default_value = "3")]
    pub count: usize,

    /// Base seed (default: from config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Date ages are measured against (default: today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub on: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: DataFormat,
}

/// Data output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataFormat {
    /// YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Write the default configuration to ./formprobe.yaml
    #[arg(long, conflicts_with = "validate")]
    pub init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    pub force: bool,

    /// Only validate the configuration
    #[arg(long)]
    pub validate: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_test_command() {
        let cli = Cli::try_parse_from([
            "formprobe", "-vv", "test", "-j", "2", "--filter", "reference", "--headed",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Test(args) => {
                assert_eq!(args.workers, Some(2));
                assert_eq!(args.filter.as_deref(), Some("reference"));
                assert!(args.headed);
                assert!(!args.skip_gender);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_data_command() {
        let cli = Cli::try_parse_from([
            "formprobe", "data", "-n", "5", "--seed", "9", "--on", "2024-02-29", "-f", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Data(args) => {
                assert_eq!(args.count, 5);
                assert_eq!(args.seed, Some(9));
                assert_eq!(args.on, NaiveDate::from_ymd_opt(2024, 2, 29));
                assert_eq!(args.format, DataFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "formprobe", "report", "--color", "never", "--log-json", "-q",
        ])
        .unwrap();
        assert_eq!(cli.color, ColorArg::Never);
        assert!(cli.log_json);
        assert!(cli.quiet);
    }

    #[test]
    fn test_force_requires_init() {
        assert!(Cli::try_parse_from(["formprobe", "config", "--force"]).is_err());
        assert!(Cli::try_parse_from(["formprobe", "config", "--init", "--validate"]).is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["formprobe", "data", "--on", "yesterday"]).is_err());
    }
}
