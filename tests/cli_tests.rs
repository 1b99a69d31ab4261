//! CLI and basic command tests

mod common;

use common::{attach, setup_test_project, tagflow, tagflow_in};
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    tagflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Labels and review workflows"));
}

#[test]
fn test_version_displays() {
    tagflow()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tagflow"));
}

#[test]
fn test_unknown_command_fails() {
    tagflow()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_generate() {
    tagflow()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagflow"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();

    tagflow_in(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".tagflow/config.yaml").exists());
    assert!(tmp.path().join(".tagflow/tagflow.db").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = setup_test_project();

    tagflow_in(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();

    tagflow_in(&tmp)
        .args(["label", "list", "Event:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a tagflow project"));
}

#[test]
fn test_works_from_subdirectory() {
    let tmp = setup_test_project();
    let nested = tmp.path().join("deep/inside");
    std::fs::create_dir_all(&nested).unwrap();
    attach(&tmp, "Tag:1", "Event:1", &[]);

    tagflow_in(&tmp)
        .current_dir(&nested)
        .args(["label", "list", "Event:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tag:1"));
}

#[test]
fn test_project_flag() {
    let tmp = setup_test_project();
    attach(&tmp, "Tag:1", "Event:1", &[]);
    let elsewhere = TempDir::new().unwrap();

    tagflow_in(&elsewhere)
        .args(["label", "list", "Event:1", "-C"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Tag:1"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let tmp = setup_test_project();

    tagflow_in(&tmp)
        .args(["--verbose", "label", "attach", "Tag:1", "Event:1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("attached label"));
}

// ============================================================================
// Derive Command Tests
// ============================================================================

#[test]
fn test_derive_color() {
    tagflow()
        .args(["derive", "color", "#1a2b3c", "--alpha", "0.5", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hex\": \"#1A2B3C\""))
        .stdout(predicate::str::contains("\"dark\": true"))
        .stdout(predicate::str::contains("\"contrast_text\": \"#FFFFFF\""))
        .stdout(predicate::str::contains("rgba(26, 43, 60, 0.5)"));
}

#[test]
fn test_derive_color_invalid() {
    tagflow()
        .args(["derive", "color", "#12345"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid color format"));
}

#[test]
fn test_derive_duration_and_percentile() {
    tagflow()
        .args(["derive", "duration", "125"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2h 5m\n"));

    tagflow()
        .args(["derive", "percentile", "80"])
        .assert()
        .success()
        .stdout(predicate::str::diff("good\n"));

    tagflow()
        .args(["derive", "percentile"])
        .assert()
        .success()
        .stdout(predicate::str::diff("unknown\n"));
}

#[test]
fn test_derive_days_until_past_date() {
    tagflow()
        .args(["derive", "days-until", "2000-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("-"));
}
