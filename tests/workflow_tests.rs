//! Review and progress workflow tests

mod common;

use common::{create_workflow, setup_test_project, tagflow_in};
use predicates::prelude::*;
use std::fs;

fn show_json(tmp: &tempfile::TempDir, id: &str) -> serde_json::Value {
    let output = tagflow_in(tmp)
        .args(["wf", "show", id, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Review lifecycle
// ============================================================================

#[test]
fn test_full_review_cycle() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    assert!(id.starts_with("WFL-"));
    assert_eq!(show_json(&tmp, &id)["status"], "draft");

    tagflow_in(&tmp)
        .args(["wf", "submit", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("submitted"));

    tagflow_in(&tmp)
        .args(["wf", "review", &id, "--as", "Person:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("under_review"));

    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1", "-m", "looks good"])
        .assert()
        .success()
        .stdout(predicate::str::contains("approved"));

    let record = show_json(&tmp, &id);
    assert_eq!(record["status"], "approved");
    assert_eq!(record["effective_state"], "approved");
    assert_eq!(record["valid"], true);
    assert_eq!(record["notes"], "looks good");
    assert_eq!(record["reviewer"]["id"], 1);
    // Default validity from config
    let days = record["days_until_expiry"].as_i64().unwrap();
    assert!((364..=365).contains(&days));

    tagflow_in(&tmp)
        .args(["wf", "valid", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid (expires in"));
}

#[test]
fn test_approve_from_submitted_passes_through_review() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();

    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1", "--no-expiry"])
        .assert()
        .success();

    let record = show_json(&tmp, &id);
    assert_eq!(record["status"], "approved");
    assert!(record.get("expires_at").is_none());
    assert_eq!(record["valid"], true);
}

#[test]
fn test_invalid_transitions_fail() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);

    // Cannot approve a draft
    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid status transition"));

    // Cannot submit twice
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();
    tagflow_in(&tmp)
        .args(["wf", "submit", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid status transition"));

    assert_eq!(show_json(&tmp, &id)["status"], "submitted");
}

#[test]
fn test_reject_requires_reason_and_reopen() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();
    tagflow_in(&tmp)
        .args(["wf", "review", &id, "--as", "Person:1"])
        .assert()
        .success();

    tagflow_in(&tmp)
        .args(["wf", "reject", &id, "--as", "Person:1", "--reason", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reason is required"));

    tagflow_in(&tmp)
        .args(["wf", "reject", &id, "--as", "Person:1", "--reason", "missing data"])
        .assert()
        .success();
    let record = show_json(&tmp, &id);
    assert_eq!(record["status"], "rejected");
    assert_eq!(record["rejection_reason"], "missing data");
    assert_eq!(record["valid"], false);

    tagflow_in(&tmp).args(["wf", "reopen", &id]).assert().success();
    assert_eq!(show_json(&tmp, &id)["status"], "draft");
}

#[test]
fn test_reviewer_required() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();

    tagflow_in(&tmp)
        .args(["wf", "review", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No acting reviewer"));
}

#[test]
fn test_configured_actor_and_validity() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join(".tagflow/config.yaml"),
        "actor: \"Person:9\"\nworkflow:\n  default_validity_days: 30\n",
    )
    .unwrap();

    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();
    tagflow_in(&tmp).args(["wf", "approve", &id]).assert().success();

    let record = show_json(&tmp, &id);
    assert_eq!(record["reviewer"]["id"], 9);
    let days = record["days_until_expiry"].as_i64().unwrap();
    assert!((29..=30).contains(&days));
}

#[test]
fn test_approve_valid_days_overrides_config() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();

    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1", "--valid-days", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid until"));

    let record = show_json(&tmp, &id);
    let days = record["days_until_expiry"].as_i64().unwrap();
    assert!((29..=30).contains(&days));
}

#[test]
fn test_approve_no_expiry_overrides_config() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();

    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1", "--no-expiry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no expiry"));

    let record = show_json(&tmp, &id);
    assert!(record.get("expires_at").is_none());
    assert!(record["days_until_expiry"].is_null());
    assert_eq!(record["valid"], true);
}

#[test]
fn test_approve_zero_valid_days_never_expires() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();

    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1", "--valid-days", "0"])
        .assert()
        .success();

    let record = show_json(&tmp, &id);
    assert!(record.get("expires_at").is_none());
    assert_eq!(record["valid"], true);
}

#[test]
fn test_approve_huge_validity_fails_cleanly() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();

    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1", "--valid-days", "4000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("past the last representable date"))
        .stderr(predicate::str::contains("panicked").not());

    // Nothing was saved
    assert_eq!(show_json(&tmp, &id)["status"], "submitted");
}

#[test]
fn test_approve_huge_configured_validity_fails_cleanly() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join(".tagflow/config.yaml"),
        "workflow:\n  default_validity_days: 4294967295\n",
    )
    .unwrap();

    let id = create_workflow(&tmp, "Person:5", false);
    tagflow_in(&tmp).args(["wf", "submit", &id]).assert().success();
    tagflow_in(&tmp)
        .args(["wf", "approve", &id, "--as", "Person:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("past the last representable date"));
}

// ============================================================================
// Progress lifecycle
// ============================================================================

#[test]
fn test_progress_completes_once() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Course:3", true);
    assert_eq!(show_json(&tmp, &id)["status"], "in_progress");

    tagflow_in(&tmp)
        .args(["wf", "progress", &id, "40", "--value", "2.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("progress 40%"));

    tagflow_in(&tmp)
        .args(["wf", "progress", &id, "250"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 points earned"));

    let record = show_json(&tmp, &id);
    assert_eq!(record["status"], "completed");
    assert_eq!(record["progress"], 100);
    assert_eq!(record["value"], 2.5);
    assert_eq!(record["points_earned"], 10);

    tagflow_in(&tmp)
        .args(["wf", "progress", &id, "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("points earned").not());
}

#[test]
fn test_negative_progress_clamps() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Course:3", true);

    tagflow_in(&tmp)
        .args(["wf", "progress", &id, "-5"])
        .assert()
        .success();
    assert_eq!(show_json(&tmp, &id)["progress"], 0);
}

#[test]
fn test_progress_on_review_record_fails() {
    let tmp = setup_test_project();
    let id = create_workflow(&tmp, "Person:5", false);

    tagflow_in(&tmp)
        .args(["wf", "progress", &id, "50"])
        .assert()
        .failure();
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_filters() {
    let tmp = setup_test_project();
    let a = create_workflow(&tmp, "Person:5", false);
    let b = create_workflow(&tmp, "Person:6", false);
    let c = create_workflow(&tmp, "Person:5", true);
    tagflow_in(&tmp).args(["wf", "submit", &a]).assert().success();

    tagflow_in(&tmp)
        .args(["wf", "list", "--status", "submitted", "--format", "id"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", a)));

    tagflow_in(&tmp)
        .args(["wf", "list", "--subject", "Person:5", "--format", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains(a.as_str()))
        .stdout(predicate::str::contains(c.as_str()))
        .stdout(predicate::str::contains(b.as_str()).not());

    tagflow_in(&tmp)
        .args(["wf", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STATE"))
        .stdout(predicate::str::contains("in_progress"));
}
