//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

/// Helper to get a tagflow command
pub fn tagflow() -> Command {
    Command::new(cargo::cargo_bin!("tagflow"))
}

/// A tagflow command running inside `tmp`, isolated from the user's own
/// configuration
pub fn tagflow_in(tmp: &TempDir) -> Command {
    let mut cmd = tagflow();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".xdg"))
        .env("HOME", tmp.path())
        .env_remove("TAGFLOW_PROJECT")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a test project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tagflow_in(&tmp).arg("init").assert().success();
    tmp
}

fn stdout_id(output: std::process::Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Attach a label and return the association id
pub fn attach(tmp: &TempDir, label: &str, target: &str, extra: &[&str]) -> String {
    let output = tagflow_in(tmp)
        .args(["label", "attach", label, target])
        .args(extra)
        .args(["--format", "id"])
        .output()
        .unwrap();
    stdout_id(output)
}

/// Create a workflow and return its id
pub fn create_workflow(tmp: &TempDir, subject: &str, progress: bool) -> String {
    let mut cmd = tagflow_in(tmp);
    cmd.args(["wf", "new", subject, "--format", "id"]);
    if progress {
        cmd.arg("--progress");
    }
    stdout_id(cmd.output().unwrap())
}
