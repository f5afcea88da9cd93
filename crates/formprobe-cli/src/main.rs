//! formprobe CLI: run the DemoQA registration suite
//!
//! ## Usage
//!
//! ```bash
//! formprobe test                        # Run every case
//! formprobe test --filter reference -j1 # One case, one worker
//! formprobe report                      # Show the last report
//! formprobe data -n 5 --seed 42         # Print generated records
//! formprobe config --init               # Write formprobe.yaml
//! ```

use clap::Parser;
use formprobe::{
    build_cases, FormFieldSet, SuiteConfig, SuiteReport, TestDataProvider, DEFAULT_CONFIG_FILE,
    REPORT_FILE,
};
use formprobe_cli::{
    apply_test_overrides, filter_cases, logging, render_report, Cli, CliConfig, CliError,
    CliResult, Commands, ConfigArgs, DataArgs, DataFormat, ReportArgs, ReportFormat, SuiteRunner,
    TestArgs,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    logging::init(&config);

    match cli.command {
        Commands::Test(ref args) => run_test(&config, cli.config.as_deref(), args),
        Commands::Report(ref args) => run_report(cli.config.as_deref(), args),
        Commands::Data(ref args) => run_data(cli.config.as_deref(), args),
        Commands::Config(ref args) => run_config(cli.config.as_deref(), args),
    }
}

fn run_test(config: &CliConfig, path: Option<&Path>, args: &TestArgs) -> CliResult<ExitCode> {
    let mut suite = SuiteConfig::load_or_default(path)?;
    apply_test_overrides(&mut suite, args);
    suite.validate()?;

    let provider = TestDataProvider::today(suite.base_seed);
    let cases = filter_cases(build_cases(&suite, &provider), args.filter.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(SuiteRunner::new(suite, config).run(cases))?;

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_report(path: Option<&Path>, args: &ReportArgs) -> CliResult<ExitCode> {
    let file = match args.path {
        Some(ref p) => p.clone(),
        None => SuiteConfig::load_or_default(path)?.output_dir.join(REPORT_FILE),
    };
    let report = SuiteReport::load(&file)?;
    match args.format {
        ReportFormat::Text => print!("{}", render_report(&report)),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::report_generation(e.to_string()))?
        ),
    }
    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// A generated record with the seed that reproduces it
#[derive(Serialize)]
struct SeededRecord {
    seed: u64,
    #[serde(flatten)]
    fields: FormFieldSet,
}

fn run_data(path: Option<&Path>, args: &DataArgs) -> CliResult<ExitCode> {
    let suite = SuiteConfig::load_or_default(path)?;
    let base_seed = args.seed.unwrap_or(suite.base_seed);
    let provider = match args.on {
        Some(date) => TestDataProvider::new(base_seed, date),
        None => TestDataProvider::today(base_seed),
    };
    let records: Vec<SeededRecord> = provider
        .generate_many(args.count)
        .into_iter()
        .enumerate()
        .map(|(i, fields)| SeededRecord {
            seed: base_seed.wrapping_add(i as u64),
            fields,
        })
        .collect();

    let text = match args.format {
        DataFormat::Yaml => serde_yaml_ng::to_string(&records)
            .map_err(|e| CliError::report_generation(e.to_string()))?,
        DataFormat::Json => serde_json::to_string_pretty(&records)
            .map_err(|e| CliError::report_generation(e.to_string()))?,
    };
    println!("{}", text.trim_end());
    Ok(ExitCode::SUCCESS)
}

fn run_config(path: Option<&Path>, args: &ConfigArgs) -> CliResult<ExitCode> {
    if args.init {
        let target = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        if target.exists() && !args.force {
            return Err(CliError::config(format!(
                "{} already exists (use --force to overwrite)",
                target.display()
            )));
        }
        std::fs::write(&target, SuiteConfig::default().to_yaml()?)?;
        println!("Wrote {}", target.display());
        return Ok(ExitCode::SUCCESS);
    }

    let suite = SuiteConfig::load_or_default(path)?;
    suite.validate()?;
    if args.validate {
        println!("Configuration is valid ({})", suite.form_url());
    } else {
        print!("{}", suite.to_yaml()?);
    }
    Ok(ExitCode::SUCCESS)
}
