//! Smoke tests for the ats-probe CLI
//!
//! These tests verify basic CLI functionality works correctly.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the ats-probe binary
fn ats_probe() -> Command {
    let mut cmd = Command::cargo_bin("ats-probe").expect("ats-probe binary should exist");
    cmd.env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    ats_probe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    ats_probe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ATS"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("steps"));
}

#[test]
fn test_no_args_fails() {
    ats_probe().assert().failure();
}

#[test]
fn test_run_help_lists_flags() {
    ats_probe()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--profile"))
        .stdout(predicate::str::contains("--policy"))
        .stdout(predicate::str::contains("--headed"));
}

// ============================================================================
// Steps / Config
// ============================================================================

#[test]
fn test_steps_lists_vocabulary() {
    ats_probe()
        .arg("steps")
        .assert()
        .success()
        .stdout(predicate::str::contains("Login to system with"))
        .stdout(predicate::str::contains("find option id with text"))
        .stdout(predicate::str::contains("verify page opened successfully"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();
    ats_probe()
        .current_dir(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("policy: fail-fast"))
        .stdout(predicate::str::contains("poll_interval: 1"))
        .stdout(predicate::str::contains(".modal-backdrop"));
}

#[test]
fn test_config_reads_discovered_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ats-probe.yaml"), "policy: soft\n").unwrap();
    ats_probe()
        .current_dir(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("policy: soft"));
}

#[test]
fn test_config_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "menu:\n  strategies: []\n").unwrap();
    ats_probe()
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

// ============================================================================
// Run argument errors
// ============================================================================

#[test]
fn test_run_missing_feature_directory() {
    let dir = TempDir::new().unwrap();
    ats_probe()
        .current_dir(dir.path())
        .args(["run", "--features", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_run_rejects_zero_jobs() {
    let dir = TempDir::new().unwrap();
    ats_probe()
        .current_dir(dir.path())
        .args(["run", "--profile", "parallel", "--jobs", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--jobs"));
}

#[test]
fn test_run_rejects_unknown_policy() {
    ats_probe()
        .args(["run", "--policy", "lenient"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fail-fast or soft"));
}
