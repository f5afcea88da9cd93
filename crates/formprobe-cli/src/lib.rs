//! formprobe CLI library
//!
//! Command-line interface for the formprobe registration suite.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, DataArgs, DataFormat, ReportArgs, ReportFormat, TestArgs,
};
pub use config::{apply_test_overrides, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_report, ProgressReporter};
pub use runner::{filter_cases, SuiteRunner};
