//! Smoke tests for the formprobe CLI
//!
//! Nothing here launches a browser: `test` is only exercised up to config
//! validation.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use formprobe::{CaseResult, CaseSource, FormFieldSet, ScenarioCase, SuiteConfig, SuiteReport};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the formprobe binary, isolated from the caller's env
fn formprobe(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("formprobe").expect("formprobe binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("FORMPROBE_CONFIG")
        .env_remove("FORMPROBE_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.0"));
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("test"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("data"));
}

#[test]
fn test_no_args_fails() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir).assert().failure();
}

// ============================================================================
// data
// ============================================================================

#[test]
fn test_data_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let run = || {
        formprobe(&dir)
            .args(["data", "-n", "2", "--seed", "7", "--on", "2025-06-01", "-f", "json"])
            .output()
            .unwrap()
    };
    let first = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, run().stdout);

    let records: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["seed"], 7);
    assert_eq!(records[1]["seed"], 8);
    assert_eq!(records[0]["phone"].as_str().unwrap().len(), 10);
}

#[test]
fn test_data_yaml_default() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .args(["data", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seed: 123"))
        .stdout(predicate::str::contains("firstName:"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_shows_defaults() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url: https://demoqa.com"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir).args(["config", "--init"]).assert().success();
    assert!(dir.path().join("formprobe.yaml").exists());

    formprobe(&dir)
        .args(["config", "--init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    formprobe(&dir)
        .args(["config", "--init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_file_is_picked_up() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("formprobe.yaml"), "data_sets: 9\n").unwrap();
    formprobe(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("data_sets: 9"));
}

#[test]
fn test_config_validate_rejects_firefox() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("formprobe.yaml"), "browser: firefox\n").unwrap();
    formprobe(&dir)
        .args(["config", "--validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("firefox"));
}

// ============================================================================
// test / report
// ============================================================================

#[test]
fn test_test_rejects_bad_base_url_before_launch() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .args(["test", "--base-url", "ftp://demoqa.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url"));
}

#[test]
fn test_report_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    formprobe(&dir)
        .arg("report")
        .assert()
        .failure()
        .stderr(predicate::str::contains("I/O"));
}

#[test]
fn test_report_renders_saved_run() {
    let dir = TempDir::new().unwrap();
    let case = ScenarioCase {
        name: "Form submission with reference data".to_string(),
        source: CaseSource::Reference,
        fields: FormFieldSet::reference_case(),
    };
    let report = SuiteReport::begin(&SuiteConfig::default())
        .finish(vec![CaseResult::aborted(&case, "no chromium")]);
    let path = report.save(dir.path()).unwrap();

    formprobe(&dir)
        .args(["report", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL Form submission with reference data"))
        .stdout(predicate::str::contains("no chromium"));

    formprobe(&dir)
        .args(["report", "-f", "json", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains(report.run_id.to_string()));
}
